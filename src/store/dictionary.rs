//! Term interning
//!
//! Every term the store references is interned once and addressed by a
//! [`TermId`]. Index keys are fixed-size id arrays, so prefix scans are plain
//! range queries and no term text is duplicated across the rotations.

use crate::rdf::RdfTerm;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Interned term identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u64);

impl TermId {
    /// Lower bound used to pad scan prefixes; never assigned
    pub const MIN: TermId = TermId(0);
    /// Reserved id of the default graph
    pub const DEFAULT_GRAPH: TermId = TermId(1);
    /// Upper bound used to pad scan prefixes; never assigned
    pub const MAX: TermId = TermId(u64::MAX);

    #[cfg(test)]
    pub(crate) fn from_u64(id: u64) -> Self {
        TermId(id)
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct DictionaryEntry {
    term: Arc<RdfTerm>,
    refs: usize,
}

/// Reference-counted bidirectional term <-> id map
#[derive(Debug)]
pub struct TermDictionary {
    ids: FxHashMap<Arc<RdfTerm>, TermId>,
    entries: FxHashMap<TermId, DictionaryEntry>,
    next_id: u64,
}

impl TermDictionary {
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            entries: FxHashMap::default(),
            next_id: TermId::DEFAULT_GRAPH.0 + 1,
        }
    }

    /// Id of an already interned term
    pub fn lookup(&self, term: &RdfTerm) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    /// Intern a term and take one reference on it
    pub fn acquire(&mut self, term: &RdfTerm) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.refs += 1;
            }
            return id;
        }

        let id = TermId(self.next_id);
        self.next_id += 1;
        let term = Arc::new(term.clone());
        self.ids.insert(Arc::clone(&term), id);
        self.entries.insert(id, DictionaryEntry { term, refs: 1 });
        id
    }

    /// Drop one reference; the term is forgotten when none remain
    pub fn release(&mut self, id: TermId) {
        let remove = match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.refs = entry.refs.saturating_sub(1);
                entry.refs == 0
            }
            None => false,
        };
        if remove {
            if let Some(entry) = self.entries.remove(&id) {
                self.ids.remove(&entry.term);
            }
        }
    }

    /// Term behind an id
    pub fn resolve(&self, id: TermId) -> Option<&Arc<RdfTerm>> {
        self.entries.get(&id).map(|entry| &entry.term)
    }

    /// Number of live terms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.entries.clear();
    }
}

impl Default for TermDictionary {
    fn default() -> Self {
        Self::new()
    }
}
