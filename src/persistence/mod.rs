//! Persistence layer for the triple store
//!
//! Durable backing for the in-memory engine:
//! - Write-through of every membership change to RocksDB
//! - Replay of stored quads and declared graphs on open

pub mod storage;

pub use storage::{QuadStorage, StorageError, StorageResult, StoredQuad};
