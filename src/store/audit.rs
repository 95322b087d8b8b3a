//! Commit / rollback on top of a triple store
//!
//! `AuditableStore` forwards every mutation to the wrapped store and records
//! the operation that reverses it. `rollback` replays that log newest first,
//! `commit` forgets it. The log lives in memory only: with a persistent
//! backing each forwarded write is already durable, and a crash before
//! `commit` cannot be rolled back.

use super::engine::{StoreResult, TripleStore};
use crate::rdf::{GraphName, Quad, Triple, TriplePattern};
use tracing::debug;

/// Reverse of one effective change
#[derive(Debug, Clone, PartialEq, Eq)]
enum UndoOp {
    /// A new membership was added
    Unlink { triple: Triple, graph: GraphName },
    /// A membership was removed
    Relink {
        triple: Triple,
        graph: GraphName,
        quoted: bool,
    },
    /// A quoted membership was upgraded to asserted
    Requote { triple: Triple, graph: GraphName },
    /// A graph was declared
    Undeclare { graph: GraphName },
    /// A graph declaration was dropped
    Redeclare { graph: GraphName },
}

/// Store wrapper that can undo everything since the last commit
pub struct AuditableStore {
    store: TripleStore,
    undo: Vec<UndoOp>,
}

impl AuditableStore {
    pub fn new(store: TripleStore) -> Self {
        Self {
            store,
            undo: Vec::new(),
        }
    }

    /// Read access to the wrapped store
    pub fn store(&self) -> &TripleStore {
        &self.store
    }

    /// Unwrap the store; pending changes stay applied
    pub fn into_inner(self) -> TripleStore {
        self.store
    }

    /// Number of recorded reverse operations
    pub fn pending(&self) -> usize {
        self.undo.len()
    }

    pub fn add(&mut self, triple: &Triple, graph: &GraphName, quoted: bool) -> StoreResult<()> {
        let previous = self.store.membership(triple, graph)?;
        self.store.add(triple, graph, quoted)?;

        match previous {
            None => self.undo.push(UndoOp::Unlink {
                triple: triple.clone(),
                graph: graph.clone(),
            }),
            Some(true) if !quoted => self.undo.push(UndoOp::Requote {
                triple: triple.clone(),
                graph: graph.clone(),
            }),
            Some(_) => {}
        }
        Ok(())
    }

    pub fn insert(&mut self, triple: Triple) -> StoreResult<()> {
        self.add(&triple, &GraphName::DefaultGraph, false)
    }

    pub fn add_quad(&mut self, quad: &Quad) -> StoreResult<()> {
        self.add(&quad.as_triple(), &quad.graph, false)
    }

    pub fn remove(&mut self, pattern: &TriplePattern, graph: Option<&GraphName>) -> StoreResult<()> {
        let mut reverse = Vec::new();
        if let Some(graph) = graph {
            if pattern.is_wildcard() && self.store.is_declared(graph)? {
                reverse.push(UndoOp::Redeclare {
                    graph: graph.clone(),
                });
            }
        }

        let matched: Vec<Triple> = self
            .store
            .triples(pattern, graph)?
            .map(|(triple, _)| triple)
            .collect();
        for triple in matched {
            match graph {
                Some(graph) => {
                    if let Some(quoted) = self.store.membership(&triple, graph)? {
                        reverse.push(UndoOp::Relink {
                            triple,
                            graph: graph.clone(),
                            quoted,
                        });
                    }
                }
                None => {
                    for (graph, quoted) in self.memberships(&triple)? {
                        reverse.push(UndoOp::Relink {
                            triple: triple.clone(),
                            graph,
                            quoted,
                        });
                    }
                }
            }
        }

        self.store.remove(pattern, graph)?;
        self.undo.extend(reverse);
        Ok(())
    }

    pub fn add_graph(&mut self, graph: &GraphName) -> StoreResult<()> {
        let declared = graph.is_default_graph() || self.store.is_declared(graph)?;
        self.store.add_graph(graph)?;
        if !declared {
            self.undo.push(UndoOp::Undeclare {
                graph: graph.clone(),
            });
        }
        Ok(())
    }

    pub fn remove_graph(&mut self, graph: &GraphName) -> StoreResult<()> {
        self.remove(&TriplePattern::any(), Some(graph))
    }

    /// Keep every change since the last commit
    pub fn commit(&mut self) {
        debug!("Committed {} operations", self.undo.len());
        self.undo.clear();
    }

    /// Undo every change since the last commit, newest first
    ///
    /// On error the operations not yet replayed stay pending.
    pub fn rollback(&mut self) -> StoreResult<()> {
        let count = self.undo.len();
        while let Some(op) = self.undo.pop() {
            if let Err(err) = self.revert(&op) {
                self.undo.push(op);
                return Err(err);
            }
        }
        debug!("Rolled back {} operations", count);
        Ok(())
    }

    fn revert(&mut self, op: &UndoOp) -> StoreResult<()> {
        match op {
            UndoOp::Unlink { triple, graph } => self.store.remove(&triple.as_pattern(), Some(graph)),
            UndoOp::Relink {
                triple,
                graph,
                quoted,
            } => self.store.add(triple, graph, *quoted),
            UndoOp::Requote { triple, graph } => {
                self.store.remove(&triple.as_pattern(), Some(graph))?;
                self.store.add(triple, graph, true)
            }
            UndoOp::Undeclare { graph } => {
                // Dropping the graph also drops members it had before the
                // declaration; put those back
                let members: Vec<Triple> = self
                    .store
                    .triples(&TriplePattern::any(), Some(graph))?
                    .map(|(triple, _)| triple)
                    .collect();
                let mut flagged = Vec::with_capacity(members.len());
                for triple in members {
                    if let Some(quoted) = self.store.membership(&triple, graph)? {
                        flagged.push((triple, quoted));
                    }
                }
                self.store.remove_graph(graph)?;
                for (triple, quoted) in &flagged {
                    self.store.add(triple, graph, *quoted)?;
                }
                Ok(())
            }
            UndoOp::Redeclare { graph } => self.store.add_graph(graph),
        }
    }

    fn memberships(&self, triple: &Triple) -> StoreResult<Vec<(GraphName, bool)>> {
        let asserted = self.store.contexts(Some(triple))?;
        let quoted = self.store.quoted_contexts(triple)?;
        Ok(asserted
            .into_iter()
            .map(|graph| (graph, false))
            .chain(quoted.into_iter().map(|graph| (graph, true)))
            .collect())
    }
}

impl From<TripleStore> for AuditableStore {
    fn from(store: TripleStore) -> Self {
        Self::new(store)
    }
}
