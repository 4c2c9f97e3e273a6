//! Node Lifecycle Module
//!
//! Owns the embedded storage engine behind every physical node.
//!
//! ## Core Concepts
//! - **Engine Seam**: `StorageEngine` is the opaque ordered byte store a node exposes;
//!   `EngineFactory` opens one at a filesystem location.
//! - **Backends**: `RocksEngine` (one RocksDB directory per node) and `MemoryEngine`
//!   (ordered, in-process, for ephemeral clusters).
//! - **Registry**: `NodeManager` registers, looks up, replaces and closes engines.
//!   It performs the only disk I/O of the routing core.

pub mod engine;
pub mod manager;
pub mod memory;
pub mod rocks;

pub use engine::{EngineFactory, EngineKind, EngineOptions, StorageEngine};
pub use manager::NodeManager;
pub use memory::{MemoryEngine, MemoryEngineFactory};
pub use rocks::{RocksEngine, RocksEngineFactory};
