//! Per-triple context membership
//!
//! Every stored triple owns a membership record mapping context id -> quoted
//! flag. Nearly all triples share the same record (default graph, asserted),
//! so records are `Arc`s: the common shape aliases one shared value and a
//! private copy is only made, through `Arc::make_mut`, on the first deviation.
//! A record that mutates back into the common shape is re-aliased.

use super::dictionary::TermId;
use super::index::TripleKey;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Context id -> quoted flag, in first-membership order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Membership {
    contexts: IndexMap<TermId, bool>,
}

impl Membership {
    fn single(context: TermId, quoted: bool) -> Self {
        let mut contexts = IndexMap::with_capacity(1);
        contexts.insert(context, quoted);
        Self { contexts }
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Quoted flag of one context, `None` when not a member
    pub fn quoted(&self, context: TermId) -> Option<bool> {
        self.contexts.get(&context).copied()
    }

    /// Whether any membership is asserted
    pub fn is_asserted(&self) -> bool {
        self.contexts.values().any(|quoted| !quoted)
    }

    /// Context ids, optionally skipping quoted memberships
    pub fn contexts(&self, include_quoted: bool) -> impl Iterator<Item = TermId> + '_ {
        self.contexts
            .iter()
            .filter(move |(_, quoted)| include_quoted || !**quoted)
            .map(|(context, _)| *context)
    }
}

/// Outcome of recording a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The triple had no membership before
    pub triple_created: bool,
    /// The (triple, context) pair is new
    pub membership_created: bool,
}

/// Member counts of one context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextStats {
    pub members: usize,
    pub asserted: usize,
}

/// Owner of every membership record
#[derive(Debug)]
pub struct ContextRegistry {
    records: FxHashMap<TripleKey, Arc<Membership>>,
    shared_default: Arc<Membership>,
    stats: FxHashMap<TermId, ContextStats>,
    declared: FxHashSet<TermId>,
    asserted_triples: usize,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self {
            records: FxHashMap::default(),
            shared_default: Arc::new(Membership::single(TermId::DEFAULT_GRAPH, false)),
            stats: FxHashMap::default(),
            declared: FxHashSet::default(),
            asserted_triples: 0,
        }
    }

    /// Membership record of a stored triple
    pub fn membership(&self, key: &TripleKey) -> Option<&Membership> {
        self.records.get(key).map(|record| record.as_ref())
    }

    /// Whether the triple currently has any membership
    pub fn contains(&self, key: &TripleKey) -> bool {
        self.records.contains_key(key)
    }

    /// Whether the triple is a member (asserted or quoted) of a context
    pub fn has_membership(&self, key: &TripleKey, context: TermId) -> bool {
        self.membership(key)
            .map_or(false, |membership| membership.quoted(context).is_some())
    }

    /// Add or merge one (context -> quoted) entry
    ///
    /// An asserted membership is never downgraded to quoted.
    pub fn record_membership(&mut self, key: &TripleKey, context: TermId, quoted: bool) -> RecordOutcome {
        let record = match self.records.get_mut(key) {
            Some(record) => record,
            None => {
                let record = if context == TermId::DEFAULT_GRAPH && !quoted {
                    Arc::clone(&self.shared_default)
                } else {
                    Arc::new(Membership::single(context, quoted))
                };
                self.records.insert(*key, record);
                let stats = self.stats.entry(context).or_default();
                stats.members += 1;
                if !quoted {
                    stats.asserted += 1;
                    self.asserted_triples += 1;
                }
                return RecordOutcome {
                    triple_created: true,
                    membership_created: true,
                };
            }
        };

        let previous = record.quoted(context);
        let merged = previous.map_or(quoted, |was_quoted| was_quoted && quoted);
        if previous == Some(merged) {
            return RecordOutcome {
                triple_created: false,
                membership_created: false,
            };
        }

        let was_asserted = record.is_asserted();
        Arc::make_mut(record).contexts.insert(context, merged);
        let now_asserted = record.is_asserted();
        if **record == *self.shared_default {
            *record = Arc::clone(&self.shared_default);
        }

        let stats = self.stats.entry(context).or_default();
        if previous.is_none() {
            stats.members += 1;
        }
        if !merged {
            stats.asserted += 1;
        }
        if now_asserted && !was_asserted {
            self.asserted_triples += 1;
        }

        RecordOutcome {
            triple_created: false,
            membership_created: previous.is_none(),
        }
    }

    /// Drop one context entry
    ///
    /// Returns `None` when the triple was not a member of `context`, otherwise
    /// whether the triple still has any membership left. A `Some(false)`
    /// result obliges the caller to purge the triple from the index set.
    pub fn clear_membership(&mut self, key: &TripleKey, context: TermId) -> Option<bool> {
        let record = self.records.get_mut(key)?;
        let was_quoted = record.quoted(context)?;
        let was_asserted = record.is_asserted();

        let still_has_any = if record.len() == 1 {
            self.records.remove(key);
            false
        } else {
            Arc::make_mut(record).contexts.shift_remove(&context);
            if **record == *self.shared_default {
                *record = Arc::clone(&self.shared_default);
            }
            true
        };

        let now_asserted = still_has_any
            && self.records.get(key).map_or(false, |record| record.is_asserted());
        if was_asserted && !now_asserted {
            self.asserted_triples -= 1;
        }

        if let Some(stats) = self.stats.get_mut(&context) {
            stats.members -= 1;
            if !was_quoted {
                stats.asserted -= 1;
            }
            if stats.members == 0 {
                self.stats.remove(&context);
            }
        }

        Some(still_has_any)
    }

    /// Contexts a triple belongs to, optionally skipping quoted memberships
    pub fn contexts_of(&self, key: &TripleKey, include_quoted: bool) -> Vec<TermId> {
        self.membership(key)
            .map(|membership| membership.contexts(include_quoted).collect())
            .unwrap_or_default()
    }

    /// Contexts that currently have a member triple or were declared
    pub fn all_context_ids(&self) -> FxHashSet<TermId> {
        self.stats
            .keys()
            .chain(self.declared.iter())
            .copied()
            .collect()
    }

    /// Register a (possibly empty) named graph; returns false if already declared
    pub fn declare(&mut self, context: TermId) -> bool {
        self.declared.insert(context)
    }

    /// Forget a declared graph; returns whether it was declared
    pub fn undeclare(&mut self, context: TermId) -> bool {
        self.declared.remove(&context)
    }

    pub fn is_declared(&self, context: TermId) -> bool {
        self.declared.contains(&context)
    }

    /// Member counts of one context
    pub fn stats(&self, context: TermId) -> ContextStats {
        self.stats.get(&context).copied().unwrap_or_default()
    }

    /// Triples with at least one asserted membership
    pub fn asserted_triples(&self) -> usize {
        self.asserted_triples
    }

    /// Triples with any membership
    pub fn triple_count(&self) -> usize {
        self.records.len()
    }

    /// Triples that alias the shared default record
    pub fn shared_records(&self) -> usize {
        self.records
            .values()
            .filter(|record| Arc::ptr_eq(record, &self.shared_default))
            .count()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.stats.clear();
        self.declared.clear();
        self.asserted_triples = 0;
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}
