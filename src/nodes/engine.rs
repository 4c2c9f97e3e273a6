//! Storage Engine Seam
//!
//! The routing layer treats each node's engine as an opaque ordered byte store.
//! Everything it needs is captured by [`StorageEngine`]; engines are created only
//! through an [`EngineFactory`] so the node registry stays backend-agnostic.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// An embedded ordered byte-key/byte-value store owned by one physical node.
///
/// Implementations must be usable from several threads at once. After [`close`]
/// every call fails with [`EngineError::Closed`].
///
/// [`close`]: StorageEngine::close
pub trait StorageEngine: Send + Sync {
    /// Returns `Ok(None)` when the key is absent, which is distinct from a failure.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), EngineError>;

    /// Deleting an absent key succeeds.
    fn delete(&self, key: &[u8]) -> Result<(), EngineError>;

    /// Releases the engine's resources.
    fn close(&self) -> Result<(), EngineError>;

    fn location(&self) -> &Path;
}

/// Opens engines at filesystem locations.
pub trait EngineFactory: Send + Sync {
    fn open(
        &self,
        location: &Path,
        options: &EngineOptions,
    ) -> Result<Arc<dyn StorageEngine>, EngineError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Per-node engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Create the node directory and database if they do not exist yet.
    pub create_if_missing: bool,
    /// Refuse to open a location that already holds a database.
    pub error_if_exists: bool,
    pub paranoid_checks: bool,
    pub max_open_files: Option<i32>,
    pub write_buffer_size: Option<usize>,
    /// fsync every write before acknowledging it.
    pub sync_writes: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            paranoid_checks: false,
            max_open_files: None,
            write_buffer_size: None,
            sync_writes: false,
        }
    }
}

/// Built-in engine backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Rocksdb,
    Memory,
}

impl EngineKind {
    pub fn factory(self) -> Arc<dyn EngineFactory> {
        match self {
            EngineKind::Rocksdb => Arc::new(super::rocks::RocksEngineFactory),
            EngineKind::Memory => Arc::new(super::memory::MemoryEngineFactory),
        }
    }
}
