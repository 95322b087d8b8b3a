//! Thread-safe store handle
//!
//! Single writer, many readers: every mutation holds the write lock for the
//! whole index + registry update, and queries materialize their results
//! before the read lock is released.

use super::engine::{StoreResult, StoreStatistics, TripleStore};
use crate::rdf::{GraphName, Quad, RdfTerm, TermPosition, Triple, TriplePattern};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to one store shared across threads
#[derive(Clone)]
pub struct SharedTripleStore {
    inner: Arc<RwLock<TripleStore>>,
}

impl SharedTripleStore {
    pub fn new(store: TripleStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    // Writers finish their in-memory update before returning, so a poisoned
    // lock still guards a consistent store.
    fn read_guard(&self) -> RwLockReadGuard<'_, TripleStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, TripleStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a closure under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&TripleStore) -> R) -> R {
        f(&self.read_guard())
    }

    /// Run a closure under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut TripleStore) -> R) -> R {
        f(&mut self.write_guard())
    }

    pub fn open(&self) -> StoreResult<()> {
        self.write_guard().open()
    }

    pub fn close(&self) -> StoreResult<()> {
        self.write_guard().close()
    }

    pub fn add(&self, triple: &Triple, graph: &GraphName, quoted: bool) -> StoreResult<()> {
        self.write_guard().add(triple, graph, quoted)
    }

    pub fn insert(&self, triple: Triple) -> StoreResult<()> {
        self.write_guard().insert(triple)
    }

    pub fn add_quad(&self, quad: &Quad) -> StoreResult<()> {
        self.write_guard().add_quad(quad)
    }

    pub fn add_n(&self, quads: impl IntoIterator<Item = (Quad, bool)>) -> StoreResult<usize> {
        self.write_guard().add_n(quads)
    }

    pub fn remove(&self, pattern: &TriplePattern, graph: Option<&GraphName>) -> StoreResult<()> {
        self.write_guard().remove(pattern, graph)
    }

    /// Matching triples, collected under the read lock
    pub fn triples(
        &self,
        pattern: &TriplePattern,
        graph: Option<&GraphName>,
    ) -> StoreResult<Vec<(Triple, Vec<GraphName>)>> {
        Ok(self.read_guard().triples(pattern, graph)?.collect())
    }

    pub fn triples_choices(
        &self,
        pattern: &TriplePattern,
        position: TermPosition,
        choices: &[RdfTerm],
        graph: Option<&GraphName>,
    ) -> StoreResult<Vec<(Triple, Vec<GraphName>)>> {
        Ok(self
            .read_guard()
            .triples_choices(pattern, position, choices, graph)?
            .collect())
    }

    pub fn contains(&self, triple: &Triple, graph: Option<&GraphName>) -> StoreResult<bool> {
        self.read_guard().contains(triple, graph)
    }

    pub fn contexts(&self, triple: Option<&Triple>) -> StoreResult<Vec<GraphName>> {
        self.read_guard().contexts(triple)
    }

    pub fn len(&self, graph: Option<&GraphName>) -> StoreResult<u64> {
        self.read_guard().len(graph)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        self.read_guard().is_empty()
    }

    pub fn add_graph(&self, graph: &GraphName) -> StoreResult<()> {
        self.write_guard().add_graph(graph)
    }

    pub fn remove_graph(&self, graph: &GraphName) -> StoreResult<()> {
        self.write_guard().remove_graph(graph)
    }

    pub fn statistics(&self) -> StoreResult<StoreStatistics> {
        self.read_guard().statistics()
    }
}

impl From<TripleStore> for SharedTripleStore {
    fn from(store: TripleStore) -> Self {
        Self::new(store)
    }
}
