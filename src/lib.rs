//! Samyama Triple Store
//!
//! An indexed, context-aware RDF triple store: triples are kept under several
//! redundant key rotations so any partially bound pattern is answered by a
//! prefix scan, each triple tracks the graphs it is asserted or quoted in, and
//! the store can be backed by RocksDB.
//!
//! # Architecture
//!
//! - ADR-001: Rust for memory safety and performance
//! - ADR-002: RocksDB for persistence
//! - Interned terms, fixed-size id keys, `BTreeSet` range scans per rotation
//!
//! # Requirements Implemented
//!
//! - ✅ REQ-RDF-001: RDF data model (triples/quads)
//! - ✅ REQ-RDF-002: RDF triple store with SPO / POS / OSP indexing
//! - ✅ REQ-RDF-004: Named graphs support, including declared empty graphs
//! - ✅ REQ-RDF-007: Asserted vs quoted graph membership
//! - ✅ REQ-RDF-008: Deterministic index selection for all 8 pattern shapes
//! - ✅ REQ-PERSIST-001: RocksDB persistence (write-through, replay on open)
//!
//! ## Example Usage
//!
//! ```rust
//! use samyama_triplestore::{GraphName, RdfTerm, Triple, TriplePattern, TripleStore};
//!
//! let mut store = TripleStore::in_memory();
//!
//! let bob = RdfTerm::iri("http://example.org/bob").unwrap();
//! let age = RdfTerm::iri("http://xmlns.com/foaf/0.1/age").unwrap();
//! let people = GraphName::iri("http://example.org/people").unwrap();
//!
//! store.add(&Triple::new(bob.clone(), age.clone(), RdfTerm::literal("23")), &people, false).unwrap();
//! store.insert(Triple::new(bob.clone(), age.clone(), RdfTerm::literal("24"))).unwrap();
//!
//! // The default graph and the named graph are counted separately
//! assert_eq!(store.len(None).unwrap(), 1);
//! assert_eq!(store.len(Some(&people)).unwrap(), 1);
//!
//! let pattern = TriplePattern::any().with_subject(bob).with_predicate(age);
//! assert_eq!(store.triples(&pattern, None).unwrap().count(), 2);
//! assert_eq!(store.triples(&pattern, Some(&people)).unwrap().count(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod persistence;
pub mod rdf;
pub mod store;

// Re-export main types for convenience
pub use persistence::{QuadStorage, StorageError, StorageResult, StoredQuad};
pub use rdf::{
    BlankNode, GraphName, Literal, NamedNode, Quad, RdfError, RdfResult, RdfTerm,
    TermPosition, Triple, TriplePattern,
};
pub use store::{
    AuditableStore, ConfigError, ConfigResult, LenMode, SharedTripleStore, StoreConfig, StoreError,
    StoreEvent, StoreResult, StoreStatistics, TripleIterator, TripleStore,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
