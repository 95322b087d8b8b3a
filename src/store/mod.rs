//! Indexed, context-aware triple store
//!
//! - `dictionary`: term interning
//! - `index`: rotated index set (SPO, POS, OSP and their context-first forms)
//! - `selector`: picks the rotation and prefix for a pattern
//! - `context`: per-triple membership records
//! - `engine`: the store itself
//! - `shared`: thread-safe handle
//! - `audit`: commit / rollback wrapper

pub mod audit;
pub mod config;
pub mod context;
pub mod dictionary;
pub mod engine;
pub mod event;
pub mod index;
pub mod selector;
pub mod shared;

pub use audit::AuditableStore;
pub use config::{ConfigError, ConfigResult, LenMode, StoreConfig};
pub use context::{ContextRegistry, ContextStats, Membership, RecordOutcome};
pub use dictionary::{TermDictionary, TermId};
pub use engine::{StoreError, StoreResult, StoreStatistics, TripleIterator, TripleStore};
pub use event::StoreEvent;
pub use index::{IndexSet, Rotation, TripleKey};
pub use selector::{IdPattern, IndexSelector, ScanPlan};
pub use shared::SharedTripleStore;
