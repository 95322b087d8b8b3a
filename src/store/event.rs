//! Store change events
//!
//! Emitted once per effective change, never for no-ops.

use crate::rdf::{GraphName, Triple};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    TripleAdded {
        triple: Triple,
        graph: GraphName,
        quoted: bool,
    },
    TripleRemoved {
        triple: Triple,
        graph: GraphName,
    },
    GraphAdded {
        graph: GraphName,
    },
    GraphRemoved {
        graph: GraphName,
    },
}
