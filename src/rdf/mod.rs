//! RDF data model for the triple store
//!
//! Terms are opaque, already-validated values: IRI and language-tag checking is
//! delegated to oxrdf at construction time, and the store only relies on
//! equality, hashing and the canonical ordering of [`RdfTerm`].
//!
//! # Example
//!
//! ```rust
//! use samyama_triplestore::rdf::{GraphName, Literal, NamedNode, Quad, RdfTerm, Triple};
//!
//! let alice = NamedNode::new("http://example.org/alice").unwrap();
//! let name = NamedNode::new("http://xmlns.com/foaf/0.1/name").unwrap();
//! let triple = Triple::new(alice, name, Literal::new_simple_literal("Alice"));
//!
//! let graph = GraphName::iri("http://example.org/people").unwrap();
//! let quad = Quad::from_triple(triple.clone(), graph);
//! assert_eq!(quad.as_triple(), triple);
//! assert!(matches!(triple.object, RdfTerm::Literal(_)));
//! ```

mod types;

pub use types::{
    BlankNode, GraphName, Literal, NamedNode, Quad, RdfError, RdfResult, RdfTerm,
    TermPosition, Triple, TriplePattern,
};
