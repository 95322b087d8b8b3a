//! RocksDB storage layer for quads
//!
//! Two column families:
//! - `quads`: key = bincode `(graph, subject, predicate, object)`, value = quoted flag byte
//! - `graphs`: key = bincode graph name of a declared graph, empty value
//!
//! Only memberships are stored; the rotated indices are rebuilt in memory on open.

use crate::rdf::{BlankNode, GraphName, Literal, NamedNode, RdfTerm, Triple};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const QUADS_CF: &str = "quads";
const GRAPHS_CF: &str = "graphs";

const ASSERTED: u8 = 0;
const QUOTED: u8 = 1;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family error
    #[error("Column family error: {0}")]
    ColumnFamily(String),

    /// A stored term no longer parses
    #[error("Invalid stored term: {0}")]
    InvalidTerm(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Serialized term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum StoredTerm {
    NamedNode(String),
    BlankNode(String),
    Literal {
        value: String,
        language: Option<String>,
        datatype: String,
    },
}

impl From<&RdfTerm> for StoredTerm {
    fn from(term: &RdfTerm) -> Self {
        match term {
            RdfTerm::NamedNode(node) => StoredTerm::NamedNode(node.as_str().to_string()),
            RdfTerm::BlankNode(node) => StoredTerm::BlankNode(node.as_str().to_string()),
            RdfTerm::Literal(lit) => StoredTerm::Literal {
                value: lit.value().to_string(),
                language: lit.language().map(str::to_string),
                datatype: lit.datatype_iri().to_string(),
            },
        }
    }
}

impl TryFrom<StoredTerm> for RdfTerm {
    type Error = StorageError;

    fn try_from(stored: StoredTerm) -> StorageResult<Self> {
        let invalid = |e: crate::rdf::RdfError| StorageError::InvalidTerm(e.to_string());
        let term = match stored {
            StoredTerm::NamedNode(iri) => NamedNode::new(&iri).map_err(invalid)?.into(),
            StoredTerm::BlankNode(id) => BlankNode::with_id(&id).map_err(invalid)?.into(),
            StoredTerm::Literal { value, language: Some(language), .. } => {
                Literal::new_language_tagged_literal(value, language)
                    .map_err(invalid)?
                    .into()
            }
            StoredTerm::Literal { value, language: None, datatype } => {
                let datatype = NamedNode::new(&datatype).map_err(invalid)?;
                Literal::new_typed_literal(value, datatype).into()
            }
        };
        Ok(term)
    }
}

/// Serialized graph name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum StoredGraph {
    Default,
    Named(StoredTerm),
}

impl From<&GraphName> for StoredGraph {
    fn from(graph: &GraphName) -> Self {
        match graph {
            GraphName::DefaultGraph => StoredGraph::Default,
            GraphName::Named(term) => StoredGraph::Named(term.into()),
        }
    }
}

impl TryFrom<StoredGraph> for GraphName {
    type Error = StorageError;

    fn try_from(stored: StoredGraph) -> StorageResult<Self> {
        match stored {
            StoredGraph::Default => Ok(GraphName::DefaultGraph),
            StoredGraph::Named(term) => Ok(GraphName::Named(term.try_into()?)),
        }
    }
}

type QuadKey = (StoredGraph, StoredTerm, StoredTerm, StoredTerm);

/// A membership read back from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuad {
    pub triple: Triple,
    pub graph: GraphName,
    pub quoted: bool,
}

/// RocksDB-backed membership storage
pub struct QuadStorage {
    db: DB,
    path: PathBuf,
    sync_writes: bool,
}

impl QuadStorage {
    /// Open or create the database at `path`
    pub fn open(path: impl AsRef<Path>, sync_writes: bool) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Opening quad storage at: {:?}", path);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(QUADS_CF, Self::cf_options()),
            ColumnFamilyDescriptor::new(GRAPHS_CF, Self::cf_options()),
        ];

        let db = DB::open_cf_descriptors(&opts, &path, cf_descriptors)?;
        info!("Quad storage opened successfully");

        Ok(Self { db, path, sync_writes })
    }

    fn cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf(&self, name: &str) -> StorageResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamily(name.to_string()))
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    fn quad_key(triple: &Triple, graph: &GraphName) -> StorageResult<Vec<u8>> {
        let key: QuadKey = (
            graph.into(),
            (&triple.subject).into(),
            (&triple.predicate).into(),
            (&triple.object).into(),
        );
        Ok(bincode::serialize(&key)?)
    }

    /// Directory the database lives in
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store or overwrite one membership
    pub fn put_quad(&self, triple: &Triple, graph: &GraphName, quoted: bool) -> StorageResult<()> {
        let cf = self.cf(QUADS_CF)?;
        let key = Self::quad_key(triple, graph)?;
        let flag = if quoted { QUOTED } else { ASSERTED };
        self.db.put_cf_opt(cf, key, [flag], &self.write_options())?;
        debug!("Stored quad {} in {}", triple, graph);
        Ok(())
    }

    /// Delete a batch of memberships atomically
    ///
    /// When `forget` names a declared graph its declaration goes in the same
    /// batch, so the quads and the graph disappear together or not at all.
    pub fn delete_quads<'a>(
        &self,
        quads: impl IntoIterator<Item = (&'a Triple, &'a GraphName)>,
        forget: Option<&GraphName>,
    ) -> StorageResult<()> {
        let quads_cf = self.cf(QUADS_CF)?;
        let mut batch = WriteBatch::default();
        for (triple, graph) in quads {
            batch.delete_cf(quads_cf, Self::quad_key(triple, graph)?);
        }
        let count = batch.len();
        if let Some(graph) = forget {
            let graphs_cf = self.cf(GRAPHS_CF)?;
            batch.delete_cf(graphs_cf, bincode::serialize(&StoredGraph::from(graph))?);
        }
        if !batch.is_empty() {
            self.db.write_opt(batch, &self.write_options())?;
            debug!("Deleted {} quads", count);
        }
        if let Some(graph) = forget {
            debug!("Deleted graph {}", graph);
        }
        Ok(())
    }

    /// Record a declared graph
    pub fn put_graph(&self, graph: &GraphName) -> StorageResult<()> {
        let cf = self.cf(GRAPHS_CF)?;
        let key = bincode::serialize(&StoredGraph::from(graph))?;
        self.db.put_cf_opt(cf, key, b"", &self.write_options())?;
        debug!("Stored graph {}", graph);
        Ok(())
    }

    /// All stored memberships (for recovery)
    pub fn scan_quads(&self) -> StorageResult<Vec<StoredQuad>> {
        let cf = self.cf(QUADS_CF)?;
        let mut quads = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let (graph, subject, predicate, object): QuadKey = bincode::deserialize(&key)?;
            quads.push(StoredQuad {
                triple: Triple::new(
                    RdfTerm::try_from(subject)?,
                    RdfTerm::try_from(predicate)?,
                    RdfTerm::try_from(object)?,
                ),
                graph: graph.try_into()?,
                quoted: value.first() == Some(&QUOTED),
            });
        }

        Ok(quads)
    }

    /// All declared graphs (for recovery)
    pub fn scan_graphs(&self) -> StorageResult<Vec<GraphName>> {
        let cf = self.cf(GRAPHS_CF)?;
        let mut graphs = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item?;
            let stored: StoredGraph = bincode::deserialize(&key)?;
            graphs.push(stored.try_into()?);
        }

        Ok(graphs)
    }

    /// Flush all data to disk
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        debug!("Flushed quad storage to disk");
        Ok(())
    }

    /// Delete the database at `path`
    pub fn destroy(path: impl AsRef<Path>) -> StorageResult<()> {
        DB::destroy(&Options::default(), path.as_ref())?;
        info!("Destroyed quad storage at: {:?}", path.as_ref());
        Ok(())
    }
}
