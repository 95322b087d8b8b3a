//! Triple store engine
//!
//! Composes the term dictionary, the rotated index set, the context registry
//! and the selector into the public store contract. The store is a two-state
//! machine: every operation except `open`/`is_open` fails with
//! [`StoreError::NotOpen`] while it is closed.
//!
//! Index set and registry are only mutated through `apply_link` and
//! `apply_unlink`, which update both in the same step: a triple has index
//! entries exactly while it has at least one membership.

use super::config::{ConfigError, LenMode, StoreConfig};
use super::context::ContextRegistry;
use super::dictionary::{TermDictionary, TermId};
use super::event::StoreEvent;
use super::index::{IndexSet, Rotation, TripleKey};
use super::selector::{IdPattern, IndexSelector};
use crate::persistence::{QuadStorage, StorageError};
use crate::rdf::{GraphName, Quad, RdfTerm, TermPosition, Triple, TriplePattern};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Triple store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store is not open")]
    NotOpen,

    #[error("Invalid triple: {0}")]
    InvalidTriple(String),

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("No store at {0:?}")]
    NoStore(PathBuf),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Point-in-time store counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStatistics {
    /// Distinct stored triples
    pub triples: usize,
    /// (triple, context) memberships, asserted or quoted
    pub memberships: usize,
    /// Live or declared contexts
    pub contexts: usize,
    /// Interned terms
    pub terms: usize,
}

/// Iterator over matching triples and their asserted contexts
///
/// Candidate keys are collected when the iterator is created; terms are
/// resolved as it advances.
pub struct TripleIterator<'a> {
    store: &'a TripleStore,
    keys: Vec<TripleKey>,
    current: usize,
}

impl<'a> TripleIterator<'a> {
    fn new(store: &'a TripleStore, keys: Vec<TripleKey>) -> Self {
        Self {
            store,
            keys,
            current: 0,
        }
    }
}

impl<'a> Iterator for TripleIterator<'a> {
    type Item = (Triple, Vec<GraphName>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.current < self.keys.len() {
            let key = self.keys[self.current];
            self.current += 1;
            if let Some(triple) = self.store.resolve_key(&key) {
                let contexts = self.store.resolve_contexts(self.store.registry.contexts_of(&key, false));
                return Some((triple, contexts));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len() - self.current))
    }
}

/// Indexed, context-aware triple store
///
/// Maintains:
/// - SPO / POS / OSP rotations over every stored triple
/// - CSPO / CPOS / COSP rotations over every (context, triple) membership
/// - Per-triple membership records (context -> quoted flag)
pub struct TripleStore {
    config: StoreConfig,
    open: bool,
    dictionary: TermDictionary,
    index: IndexSet,
    registry: ContextRegistry,
    selector: IndexSelector,
    storage: Option<QuadStorage>,
    event_sender: Option<UnboundedSender<StoreEvent>>,
}

impl TripleStore {
    /// Create a closed store
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            open: false,
            dictionary: TermDictionary::new(),
            index: IndexSet::new(),
            registry: ContextRegistry::new(),
            selector: IndexSelector::new(),
            storage: None,
            event_sender: None,
        }
    }

    /// Create an open, memory-only store
    pub fn in_memory() -> Self {
        let mut store = Self::new(StoreConfig::in_memory());
        store.open = true;
        store
    }

    /// Create a closed store that reports every effective change
    pub fn with_events(config: StoreConfig) -> (Self, UnboundedReceiver<StoreEvent>) {
        let (tx, rx) = unbounded_channel();
        let mut store = Self::new(config);
        store.event_sender = Some(tx);
        (store, rx)
    }

    /// Create a closed store from a JSON or YAML config file
    pub fn from_config_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(StoreConfig::from_file(path)?))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the store; a no-op when already open
    ///
    /// A persistent store is rebuilt from disk: declared graphs first, then
    /// every stored membership.
    pub fn open(&mut self) -> StoreResult<()> {
        if self.open {
            return Ok(());
        }

        if let Some(path) = self.config.data_path.clone() {
            if !self.config.create && !path.exists() {
                return Err(StoreError::NoStore(path));
            }

            let storage = QuadStorage::open(&path, self.config.sync_writes)?;
            let graphs = storage.scan_graphs()?;
            let quads = storage.scan_quads()?;

            self.dictionary.clear();
            self.index.clear();
            self.registry.clear();
            for graph in &graphs {
                self.apply_declare(graph);
            }
            for quad in &quads {
                self.apply_link(&quad.triple, &quad.graph, quad.quoted);
            }

            info!(
                "Recovered {} memberships and {} declared graphs from {:?}",
                quads.len(),
                graphs.len(),
                path
            );
            self.storage = Some(storage);
        }

        self.open = true;
        info!("Triple store opened");
        Ok(())
    }

    /// Close the store, flushing durable state
    pub fn close(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        // A failed flush leaves the store open with its storage attached
        if let Some(storage) = &self.storage {
            storage.flush()?;
        }
        self.storage = None;
        self.open = false;
        info!("Triple store closed");
        Ok(())
    }

    /// Delete the persistent store at `path`
    pub fn destroy(path: impl AsRef<Path>) -> StoreResult<()> {
        QuadStorage::destroy(path)?;
        Ok(())
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::NotOpen)
        }
    }

    fn validate_triple(triple: &Triple) -> StoreResult<()> {
        if triple.subject.is_literal() {
            return Err(StoreError::InvalidTriple(format!(
                "literal subject {}",
                triple.subject
            )));
        }
        if triple.predicate.is_literal() {
            return Err(StoreError::InvalidTriple(format!(
                "literal predicate {}",
                triple.predicate
            )));
        }
        Ok(())
    }

    fn validate_graph(graph: &GraphName) -> StoreResult<()> {
        match graph {
            GraphName::Named(term) if term.is_literal() => Err(StoreError::InvalidContext(
                format!("literal graph name {}", term),
            )),
            _ => Ok(()),
        }
    }

    /// Add a triple to a context
    ///
    /// Re-adding an existing membership is a no-op; an asserted membership is
    /// never downgraded to quoted.
    pub fn add(&mut self, triple: &Triple, graph: &GraphName, quoted: bool) -> StoreResult<()> {
        self.ensure_open()?;
        Self::validate_triple(triple)?;
        Self::validate_graph(graph)?;
        self.link(triple, graph, quoted)?;
        Ok(())
    }

    /// Assert a triple in the default graph
    pub fn insert(&mut self, triple: Triple) -> StoreResult<()> {
        self.add(&triple, &GraphName::DefaultGraph, false)
    }

    /// Assert a quad in its graph
    pub fn add_quad(&mut self, quad: &Quad) -> StoreResult<()> {
        self.add(&quad.as_triple(), &quad.graph, false)
    }

    /// Add many quads; returns how many memberships changed
    ///
    /// Every element is validated before the first one is applied.
    pub fn add_n(&mut self, quads: impl IntoIterator<Item = (Quad, bool)>) -> StoreResult<usize> {
        self.ensure_open()?;
        let quads: Vec<(Quad, bool)> = quads.into_iter().collect();
        for (quad, _) in &quads {
            Self::validate_triple(&quad.as_triple())?;
            Self::validate_graph(&quad.graph)?;
        }

        let mut changed = 0;
        for (quad, quoted) in &quads {
            if self.link(&quad.as_triple(), &quad.graph, *quoted)? {
                changed += 1;
            }
        }
        debug!("Added {} of {} quads", changed, quads.len());
        Ok(changed)
    }

    /// Remove matching triples
    ///
    /// With `graph = None` every membership of each match is dropped (and so
    /// the triple). An all-wildcard pattern with a named graph drops the graph.
    pub fn remove(&mut self, pattern: &TriplePattern, graph: Option<&GraphName>) -> StoreResult<()> {
        self.ensure_open()?;
        let dropped_graph = graph.filter(|graph| pattern.is_wildcard() && !graph.is_default_graph());

        let ids = match self.id_pattern(pattern, graph) {
            Some(ids) => ids,
            None => return Ok(()),
        };

        let pairs: Vec<(TripleKey, TermId)> = match ids.context {
            Some(context) => self
                .candidate_keys(&ids)
                .into_iter()
                .map(|key| (key, context))
                .collect(),
            None => self
                .candidate_keys(&ids)
                .into_iter()
                .flat_map(|key| {
                    self.registry
                        .contexts_of(&key, true)
                        .into_iter()
                        .map(move |context| (key, context))
                })
                .collect(),
        };

        let doomed: Vec<(TripleKey, TermId, Triple, GraphName)> = pairs
            .into_iter()
            .filter_map(|(key, context)| {
                let triple = self.resolve_key(&key)?;
                let graph = self.resolve_context(context)?;
                Some((key, context, triple, graph))
            })
            .collect();

        let undeclares = match (dropped_graph, ids.context) {
            (Some(_), Some(context)) => self.registry.is_declared(context),
            _ => false,
        };

        if let Some(storage) = &self.storage {
            storage.delete_quads(
                doomed.iter().map(|(_, _, triple, graph)| (triple, graph)),
                dropped_graph.filter(|_| undeclares),
            )?;
        }

        for (key, context, triple, graph) in &doomed {
            self.apply_unlink(key, *context);
            self.emit(|| StoreEvent::TripleRemoved {
                triple: triple.clone(),
                graph: graph.clone(),
            });
        }
        debug!("Removed {} memberships", doomed.len());

        if let (Some(graph), Some(context)) = (dropped_graph, ids.context) {
            if undeclares && self.registry.undeclare(context) {
                self.dictionary.release(context);
            }
            if undeclares || !doomed.is_empty() {
                info!("Dropped graph {}", graph);
                self.emit(|| StoreEvent::GraphRemoved { graph: graph.clone() });
            }
        }

        Ok(())
    }

    /// Lazily iterate matching triples with their asserted contexts
    ///
    /// With a bound graph a triple matches when it is a member of that graph,
    /// asserted or quoted.
    pub fn triples(
        &self,
        pattern: &TriplePattern,
        graph: Option<&GraphName>,
    ) -> StoreResult<TripleIterator<'_>> {
        self.ensure_open()?;
        let keys = match self.id_pattern(pattern, graph) {
            Some(ids) => self.candidate_keys(&ids),
            None => Vec::new(),
        };
        Ok(TripleIterator::new(self, keys))
    }

    /// Like [`triples`](Self::triples) with one position taking each of `choices`
    ///
    /// A triple matched by several choices is yielded once.
    pub fn triples_choices(
        &self,
        pattern: &TriplePattern,
        position: TermPosition,
        choices: &[RdfTerm],
        graph: Option<&GraphName>,
    ) -> StoreResult<TripleIterator<'_>> {
        self.ensure_open()?;
        let mut seen = FxHashSet::default();
        let mut keys = Vec::new();
        for choice in choices {
            let mut candidate = pattern.clone();
            candidate.set(position, Some(choice.clone()));
            if let Some(ids) = self.id_pattern(&candidate, graph) {
                for key in self.candidate_keys(&ids) {
                    if seen.insert(key) {
                        keys.push(key);
                    }
                }
            }
        }
        Ok(TripleIterator::new(self, keys))
    }

    /// Whether a triple is stored (in `graph`, if given)
    pub fn contains(&self, triple: &Triple, graph: Option<&GraphName>) -> StoreResult<bool> {
        self.ensure_open()?;
        let key = match self.lookup_key(triple) {
            Some(key) => key,
            None => return Ok(false),
        };
        Ok(match graph {
            None => self.registry.contains(&key),
            Some(graph) => self
                .lookup_context(graph)
                .map_or(false, |context| self.registry.has_membership(&key, context)),
        })
    }

    /// Known contexts, or the asserted contexts of one triple
    ///
    /// Without a triple this lists every context with a member plus every
    /// declared graph, the default graph first.
    pub fn contexts(&self, triple: Option<&Triple>) -> StoreResult<Vec<GraphName>> {
        self.ensure_open()?;
        match triple {
            Some(triple) => Ok(self
                .lookup_key(triple)
                .map(|key| self.resolve_contexts(self.registry.contexts_of(&key, false)))
                .unwrap_or_default()),
            None => {
                let mut contexts = self.resolve_contexts(self.registry.all_context_ids());
                contexts.sort();
                Ok(contexts)
            }
        }
    }

    /// Contexts in which a triple is only quoted
    pub fn quoted_contexts(&self, triple: &Triple) -> StoreResult<Vec<GraphName>> {
        self.ensure_open()?;
        let membership = match self.lookup_key(triple).and_then(|key| self.registry.membership(&key)) {
            Some(membership) => membership,
            None => return Ok(Vec::new()),
        };
        let quoted = membership
            .contexts(true)
            .filter(|context| membership.quoted(*context) == Some(true));
        Ok(self.resolve_contexts(quoted))
    }

    /// Membership of a triple in one context: `Some(quoted)` when it is a member
    pub fn membership(&self, triple: &Triple, graph: &GraphName) -> StoreResult<Option<bool>> {
        self.ensure_open()?;
        Ok(self.quoted_flag(triple, graph))
    }

    /// Whether a named graph is declared, independent of its members
    pub fn is_declared(&self, graph: &GraphName) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self
            .lookup_context(graph)
            .map_or(false, |context| self.registry.is_declared(context)))
    }

    /// Number of asserted triples
    ///
    /// `len(Some(graph))` counts asserted members of that graph;
    /// `len(None)` follows [`LenMode`].
    pub fn len(&self, graph: Option<&GraphName>) -> StoreResult<u64> {
        self.ensure_open()?;
        let count = match graph {
            Some(graph) => self
                .lookup_context(graph)
                .map_or(0, |context| self.registry.stats(context).asserted),
            None => match self.config.len_mode {
                LenMode::DefaultGraphOnly => self.registry.stats(TermId::DEFAULT_GRAPH).asserted,
                LenMode::UnionOfAllGraphs => self.registry.asserted_triples(),
            },
        };
        Ok(count as u64)
    }

    /// Whether no triple is stored at all
    pub fn is_empty(&self) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.registry.triple_count() == 0)
    }

    /// Distinct subjects of stored triples
    pub fn subjects(&self) -> StoreResult<Vec<RdfTerm>> {
        self.distinct_terms(Rotation::Spo)
    }

    /// Distinct predicates of stored triples
    pub fn predicates(&self) -> StoreResult<Vec<RdfTerm>> {
        self.distinct_terms(Rotation::Pos)
    }

    /// Distinct objects of stored triples
    pub fn objects(&self) -> StoreResult<Vec<RdfTerm>> {
        self.distinct_terms(Rotation::Osp)
    }

    fn distinct_terms(&self, rotation: Rotation) -> StoreResult<Vec<RdfTerm>> {
        self.ensure_open()?;
        Ok(self
            .index
            .distinct_leading(rotation)
            .into_iter()
            .filter_map(|id| self.dictionary.resolve(id).map(|term| (**term).clone()))
            .collect())
    }

    /// Declare a named graph, listed by `contexts` even while empty
    pub fn add_graph(&mut self, graph: &GraphName) -> StoreResult<()> {
        self.ensure_open()?;
        Self::validate_graph(graph)?;
        if graph.is_default_graph() {
            return Ok(());
        }
        if self
            .lookup_context(graph)
            .map_or(false, |context| self.registry.is_declared(context))
        {
            return Ok(());
        }

        if let Some(storage) = &self.storage {
            storage.put_graph(graph)?;
        }
        self.apply_declare(graph);
        info!("Added graph {}", graph);
        self.emit(|| StoreEvent::GraphAdded { graph: graph.clone() });
        Ok(())
    }

    /// Drop every membership of a graph and forget its declaration
    pub fn remove_graph(&mut self, graph: &GraphName) -> StoreResult<()> {
        self.remove(&TriplePattern::any(), Some(graph))
    }

    pub fn statistics(&self) -> StoreResult<StoreStatistics> {
        self.ensure_open()?;
        Ok(StoreStatistics {
            triples: self.index.len(),
            memberships: self.index.membership_len(),
            contexts: self.registry.all_context_ids().len(),
            terms: self.dictionary.len(),
        })
    }

    /// Persist and apply one membership; false when nothing changed
    fn link(&mut self, triple: &Triple, graph: &GraphName, quoted: bool) -> StoreResult<bool> {
        let previous = self.quoted_flag(triple, graph);
        let merged = previous.map_or(quoted, |was_quoted| was_quoted && quoted);
        if previous == Some(merged) {
            return Ok(false);
        }

        if let Some(storage) = &self.storage {
            storage.put_quad(triple, graph, merged)?;
        }
        self.apply_link(triple, graph, quoted);
        self.emit(|| StoreEvent::TripleAdded {
            triple: triple.clone(),
            graph: graph.clone(),
            quoted: merged,
        });
        Ok(true)
    }

    fn quoted_flag(&self, triple: &Triple, graph: &GraphName) -> Option<bool> {
        let key = self.lookup_key(triple)?;
        let context = self.lookup_context(graph)?;
        self.registry
            .membership(&key)
            .and_then(|membership| membership.quoted(context))
    }

    fn apply_link(&mut self, triple: &Triple, graph: &GraphName, quoted: bool) {
        let stored = self
            .lookup_key(triple)
            .filter(|key| self.registry.contains(key));
        let key = match stored {
            Some(key) => key,
            None => [
                self.dictionary.acquire(&triple.subject),
                self.dictionary.acquire(&triple.predicate),
                self.dictionary.acquire(&triple.object),
            ],
        };

        let member = self
            .lookup_context(graph)
            .filter(|context| self.registry.has_membership(&key, *context));
        let context = match member {
            Some(context) => context,
            None => self.acquire_context(graph),
        };

        let outcome = self.registry.record_membership(&key, context, quoted);
        if outcome.triple_created {
            self.index.insert(&key);
        }
        if outcome.membership_created {
            self.index.insert_membership(context, &key);
        }
    }

    fn apply_unlink(&mut self, key: &TripleKey, context: TermId) {
        let still_has_any = match self.registry.clear_membership(key, context) {
            Some(still_has_any) => still_has_any,
            None => return,
        };

        self.index.remove_membership(context, key);
        if context != TermId::DEFAULT_GRAPH {
            self.dictionary.release(context);
        }
        if !still_has_any {
            self.index.remove(key);
            for id in key {
                self.dictionary.release(*id);
            }
        }
    }

    fn apply_declare(&mut self, graph: &GraphName) {
        let context = self.acquire_context(graph);
        if !self.registry.declare(context) {
            self.dictionary.release(context);
        }
    }

    fn acquire_context(&mut self, graph: &GraphName) -> TermId {
        match graph {
            GraphName::DefaultGraph => TermId::DEFAULT_GRAPH,
            GraphName::Named(term) => self.dictionary.acquire(term),
        }
    }

    fn lookup_context(&self, graph: &GraphName) -> Option<TermId> {
        match graph {
            GraphName::DefaultGraph => Some(TermId::DEFAULT_GRAPH),
            GraphName::Named(term) => self.dictionary.lookup(term),
        }
    }

    fn lookup_key(&self, triple: &Triple) -> Option<TripleKey> {
        Some([
            self.dictionary.lookup(&triple.subject)?,
            self.dictionary.lookup(&triple.predicate)?,
            self.dictionary.lookup(&triple.object)?,
        ])
    }

    /// Resolve a pattern to ids; `None` when a bound term is unknown, so nothing matches
    fn id_pattern(&self, pattern: &TriplePattern, graph: Option<&GraphName>) -> Option<IdPattern> {
        let mut terms = [None; 3];
        let positions = [TermPosition::Subject, TermPosition::Predicate, TermPosition::Object];
        for (slot, position) in terms.iter_mut().zip(positions) {
            if let Some(term) = pattern.term(position) {
                *slot = Some(self.dictionary.lookup(term)?);
            }
        }
        let context = match graph {
            Some(graph) => Some(self.lookup_context(graph)?),
            None => None,
        };
        Some(IdPattern::new(terms, context))
    }

    fn candidate_keys(&self, pattern: &IdPattern) -> Vec<TripleKey> {
        let plan = self.selector.select(pattern);
        debug!(
            "Scanning {} with {} bound of mask {:03b}",
            plan.rotation,
            plan.bound_run(),
            pattern.mask()
        );
        self.index.scan(plan.rotation, &plan.prefix).collect()
    }

    fn resolve_key(&self, key: &TripleKey) -> Option<Triple> {
        let term = |id: TermId| self.dictionary.resolve(id).map(|term| (**term).clone());
        Some(Triple::new(term(key[0])?, term(key[1])?, term(key[2])?))
    }

    fn resolve_context(&self, context: TermId) -> Option<GraphName> {
        if context == TermId::DEFAULT_GRAPH {
            return Some(GraphName::DefaultGraph);
        }
        self.dictionary
            .resolve(context)
            .map(|term| GraphName::Named((**term).clone()))
    }

    fn resolve_contexts(&self, contexts: impl IntoIterator<Item = TermId>) -> Vec<GraphName> {
        contexts
            .into_iter()
            .filter_map(|context| self.resolve_context(context))
            .collect()
    }

    fn emit(&self, event: impl FnOnce() -> StoreEvent) {
        if let Some(sender) = &self.event_sender {
            // A dropped receiver only means nobody is listening
            let _ = sender.send(event());
        }
    }
}

impl Default for TripleStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{BlankNode, Literal};

    fn iri(value: &str) -> RdfTerm {
        RdfTerm::iri(value).unwrap()
    }

    fn bob_age(age: &str) -> Triple {
        Triple::new(
            iri("http://example.org/bob"),
            iri("http://xmlns.com/foaf/0.1/age"),
            RdfTerm::literal(age),
        )
    }

    fn c1() -> GraphName {
        GraphName::iri("http://example.org/c1").unwrap()
    }

    fn collect(store: &TripleStore, pattern: &TriplePattern, graph: Option<&GraphName>) -> Vec<Triple> {
        let mut triples: Vec<Triple> = store
            .triples(pattern, graph)
            .unwrap()
            .map(|(triple, _)| triple)
            .collect();
        triples.sort();
        triples
    }

    #[test]
    fn test_add_and_query_round_trip() {
        let mut store = TripleStore::in_memory();
        let triple = bob_age("23");
        store.add(&triple, &c1(), false).unwrap();

        let results: Vec<_> = store.triples(&triple.as_pattern(), Some(&c1())).unwrap().collect();
        assert_eq!(results, vec![(triple.clone(), vec![c1()])]);
        assert!(store.contains(&triple, Some(&c1())).unwrap());
        assert!(!store.contains(&triple, Some(&GraphName::DefaultGraph)).unwrap());
    }

    #[test]
    fn test_named_and_default_graph_scenario() {
        let mut store = TripleStore::in_memory();
        store.add(&bob_age("23"), &c1(), false).unwrap();
        store.add(&bob_age("24"), &GraphName::DefaultGraph, false).unwrap();

        assert_eq!(store.len(Some(&GraphName::DefaultGraph)).unwrap(), 1);
        assert_eq!(store.len(Some(&c1())).unwrap(), 1);
        assert_eq!(store.len(None).unwrap(), 1);

        let pattern = TriplePattern::any()
            .with_subject(iri("http://example.org/bob"))
            .with_predicate(iri("http://xmlns.com/foaf/0.1/age"));
        assert_eq!(collect(&store, &pattern, None), vec![bob_age("23"), bob_age("24")]);
        assert_eq!(collect(&store, &pattern, Some(&c1())), vec![bob_age("23")]);

        store.remove(&TriplePattern::any(), Some(&c1())).unwrap();
        assert_eq!(collect(&store, &TriplePattern::any(), None), vec![bob_age("24")]);
        assert!(!store.contexts(None).unwrap().contains(&c1()));
        assert_eq!(store.contexts(None).unwrap(), vec![GraphName::DefaultGraph]);
    }

    #[test]
    fn test_state_machine() {
        let mut store = TripleStore::new(StoreConfig::default());
        assert!(!store.is_open());
        assert!(matches!(store.insert(bob_age("23")), Err(StoreError::NotOpen)));
        assert!(matches!(store.len(None), Err(StoreError::NotOpen)));
        assert!(matches!(store.close(), Err(StoreError::NotOpen)));

        store.open().unwrap();
        store.open().unwrap();
        store.insert(bob_age("23")).unwrap();
        store.close().unwrap();
        assert!(matches!(store.triples(&TriplePattern::any(), None), Err(StoreError::NotOpen)));
        assert!(matches!(store.close(), Err(StoreError::NotOpen)));

        // A memory-only store keeps its data across close/open
        store.open().unwrap();
        assert_eq!(store.len(None).unwrap(), 1);
    }

    #[test]
    fn test_invalid_triple_is_rejected_without_mutation() {
        let mut store = TripleStore::in_memory();
        let bad = Triple::new(RdfTerm::literal("x"), iri("http://example.org/p"), iri("http://example.org/o"));
        assert!(matches!(store.insert(bad), Err(StoreError::InvalidTriple(_))));

        let bad = Triple::new(iri("http://example.org/s"), RdfTerm::literal("p"), iri("http://example.org/o"));
        assert!(matches!(store.insert(bad), Err(StoreError::InvalidTriple(_))));

        let literal_graph = GraphName::Named(RdfTerm::literal("g"));
        assert!(matches!(
            store.add(&bob_age("23"), &literal_graph, false),
            Err(StoreError::InvalidContext(_))
        ));

        assert_eq!(store.statistics().unwrap(), StoreStatistics::default());
    }

    #[test]
    fn test_add_and_remove_are_idempotent() {
        let mut store = TripleStore::in_memory();
        let triple = bob_age("23");

        store.add(&triple, &c1(), false).unwrap();
        let once = store.statistics().unwrap();
        store.add(&triple, &c1(), false).unwrap();
        assert_eq!(store.statistics().unwrap(), once);
        assert_eq!(store.len(Some(&c1())).unwrap(), 1);

        store.remove(&triple.as_pattern(), Some(&c1())).unwrap();
        store.remove(&triple.as_pattern(), Some(&c1())).unwrap();
        assert_eq!(store.statistics().unwrap(), StoreStatistics::default());

        // Nothing matches: still fine
        store.remove(&TriplePattern::any().with_object(RdfTerm::literal("missing")), None).unwrap();
    }

    #[test]
    fn test_context_isolation() {
        let mut store = TripleStore::in_memory();
        let triple = bob_age("23");
        store.add(&triple, &c1(), false).unwrap();

        assert!(collect(&store, &TriplePattern::any(), Some(&GraphName::DefaultGraph)).is_empty());
        assert_eq!(store.len(Some(&GraphName::DefaultGraph)).unwrap(), 0);
        assert_eq!(collect(&store, &TriplePattern::any(), Some(&c1())), vec![triple.clone()]);
        assert_eq!(store.contexts(Some(&triple)).unwrap(), vec![c1()]);
    }

    #[test]
    fn test_quoted_exclusion() {
        let mut store = TripleStore::in_memory();
        let triple = bob_age("23");
        store.add(&triple, &c1(), true).unwrap();

        assert_eq!(collect(&store, &TriplePattern::any(), Some(&c1())), vec![triple.clone()]);
        assert_eq!(store.len(Some(&c1())).unwrap(), 0);
        assert!(store.contexts(Some(&triple)).unwrap().is_empty());
        assert_eq!(store.quoted_contexts(&triple).unwrap(), vec![c1()]);

        // Asserting later wins; quoting again does not downgrade
        store.add(&triple, &c1(), false).unwrap();
        store.add(&triple, &c1(), true).unwrap();
        assert_eq!(store.len(Some(&c1())).unwrap(), 1);
        assert!(store.quoted_contexts(&triple).unwrap().is_empty());
    }

    #[test]
    fn test_wildcard_completeness() {
        let mut store = TripleStore::in_memory();
        let g2 = GraphName::from(BlankNode::with_id("g2").unwrap());
        store.add(&bob_age("23"), &c1(), false).unwrap();
        store.add(&bob_age("23"), &GraphName::DefaultGraph, false).unwrap();
        store.add(&bob_age("24"), &g2, true).unwrap();

        let mut results: Vec<_> = store.triples(&TriplePattern::any(), None).unwrap().collect();
        results.sort();
        assert_eq!(
            results,
            vec![
                (bob_age("23"), vec![c1(), GraphName::DefaultGraph]),
                (bob_age("24"), vec![]),
            ]
        );
    }

    #[test]
    fn test_remove_without_context_drops_every_membership() {
        let mut store = TripleStore::in_memory();
        let triple = bob_age("23");
        store.add(&triple, &c1(), false).unwrap();
        store.add(&triple, &GraphName::DefaultGraph, false).unwrap();

        store.remove(&triple.as_pattern(), None).unwrap();
        assert!(!store.contains(&triple, None).unwrap());
        assert!(store.contexts(None).unwrap().is_empty());
        assert_eq!(store.statistics().unwrap().terms, 0);
    }

    #[test]
    fn test_remove_from_one_context_keeps_the_others() {
        let mut store = TripleStore::in_memory();
        let triple = bob_age("23");
        store.add(&triple, &c1(), false).unwrap();
        store.add(&triple, &GraphName::DefaultGraph, false).unwrap();

        store.remove(&triple.as_pattern(), Some(&GraphName::DefaultGraph)).unwrap();
        assert!(store.contains(&triple, None).unwrap());
        assert_eq!(store.contexts(Some(&triple)).unwrap(), vec![c1()]);
        assert_eq!(store.statistics().unwrap().memberships, 1);
        assert_eq!(store.registry.shared_records(), 0);
    }

    #[test]
    fn test_default_graph_triples_share_membership() {
        let mut store = TripleStore::in_memory();
        for age in 0..20 {
            store.insert(bob_age(&age.to_string())).unwrap();
        }
        assert_eq!(store.registry.shared_records(), 20);

        store.add(&bob_age("3"), &c1(), false).unwrap();
        assert_eq!(store.registry.shared_records(), 19);
        store.remove(&bob_age("3").as_pattern(), Some(&c1())).unwrap();
        assert_eq!(store.registry.shared_records(), 20);
    }

    #[test]
    fn test_len_modes() {
        let config = StoreConfig::default().with_len_mode(LenMode::UnionOfAllGraphs);
        let mut union = TripleStore::new(config);
        union.open().unwrap();
        let mut default_only = TripleStore::in_memory();

        for store in [&mut union, &mut default_only] {
            store.add(&bob_age("23"), &c1(), false).unwrap();
            store.add(&bob_age("23"), &GraphName::DefaultGraph, false).unwrap();
            store.add(&bob_age("24"), &c1(), false).unwrap();
            store.add(&bob_age("25"), &c1(), true).unwrap();
        }

        assert_eq!(union.len(None).unwrap(), 2);
        assert_eq!(default_only.len(None).unwrap(), 1);
        assert_eq!(union.len(Some(&c1())).unwrap(), 2);
    }

    #[test]
    fn test_declared_graphs() {
        let mut store = TripleStore::in_memory();
        let g2 = GraphName::iri("http://example.org/g2").unwrap();
        store.add_graph(&g2).unwrap();
        store.add_graph(&g2).unwrap();
        store.add_graph(&GraphName::DefaultGraph).unwrap();
        assert_eq!(store.contexts(None).unwrap(), vec![g2.clone()]);
        assert_eq!(store.len(Some(&g2)).unwrap(), 0);

        store.add(&bob_age("23"), &g2, false).unwrap();
        store.remove(&TriplePattern::any(), Some(&g2)).unwrap();
        assert!(store.contexts(None).unwrap().is_empty());
        assert_eq!(store.statistics().unwrap().terms, 0);

        store.add_graph(&g2).unwrap();
        store.remove_graph(&g2).unwrap();
        assert!(store.contexts(None).unwrap().is_empty());
    }

    #[test]
    fn test_triples_choices_deduplicates() {
        let mut store = TripleStore::in_memory();
        store.insert(bob_age("23")).unwrap();
        store.insert(bob_age("24")).unwrap();
        store.insert(bob_age("25")).unwrap();

        let choices = vec![RdfTerm::literal("23"), RdfTerm::literal("25"), RdfTerm::literal("23")];
        let mut results: Vec<_> = store
            .triples_choices(&TriplePattern::any(), TermPosition::Object, &choices, None)
            .unwrap()
            .map(|(triple, _)| triple)
            .collect();
        results.sort();
        assert_eq!(results, vec![bob_age("23"), bob_age("25")]);
    }

    #[test]
    fn test_add_n_validates_before_applying() {
        let mut store = TripleStore::in_memory();
        let good = Quad::from_triple(bob_age("23"), c1());
        let bad = Quad::new(RdfTerm::literal("s"), iri("http://example.org/p"), RdfTerm::literal("o"), c1());

        assert!(store.add_n(vec![(good.clone(), false), (bad, false)]).is_err());
        assert!(store.is_empty().unwrap());

        let quoted = Quad::from_triple(bob_age("24"), c1());
        assert_eq!(store.add_n(vec![(good.clone(), false), (good, false), (quoted, true)]).unwrap(), 2);
        assert_eq!(store.statistics().unwrap().triples, 2);
    }

    #[test]
    fn test_distinct_terms() {
        let mut store = TripleStore::in_memory();
        store.insert(bob_age("23")).unwrap();
        store.insert(bob_age("24")).unwrap();
        let name = Triple::new(
            iri("http://example.org/alice"),
            iri("http://xmlns.com/foaf/0.1/name"),
            Literal::new_language_tagged_literal("Alice", "en").unwrap(),
        );
        store.insert(name).unwrap();

        assert_eq!(store.subjects().unwrap().len(), 2);
        assert_eq!(store.predicates().unwrap().len(), 2);
        assert_eq!(store.objects().unwrap().len(), 3);
    }

    #[test]
    fn test_events_only_for_effective_changes() {
        let (mut store, mut rx) = TripleStore::with_events(StoreConfig::default());
        store.open().unwrap();

        store.add(&bob_age("23"), &c1(), false).unwrap();
        store.add(&bob_age("23"), &c1(), false).unwrap();
        store.remove(&TriplePattern::any(), Some(&c1())).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::TripleAdded { triple: bob_age("23"), graph: c1(), quoted: false }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::TripleRemoved { triple: bob_age("23"), graph: c1() }
        );
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::GraphRemoved { graph: c1() });
        assert!(rx.try_recv().is_err());

        drop(rx);
        store.insert(bob_age("24")).unwrap();
    }
}
