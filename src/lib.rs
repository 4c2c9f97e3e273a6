//! Sharded Key-Value Store Library
//!
//! A single process hosting several storage nodes, each backed by its own embedded
//! engine. Keys are placed on nodes with a consistent-hash ring and every record is
//! written to a small replica set.
//!
//! ## Architecture Modules
//! - **`ring`**: Consistent hashing with virtual replicas. Maps a key to its ordered
//!   replica set.
//! - **`nodes`**: The storage engine seam and the registry of per-node engines.
//! - **`coordinator`**: Record operations (put, get, delete, rename, compare-and-swap)
//!   expressed as best-effort fan-out over the replica set.
//! - **`server`**: The JSON/HTTP transport and node administration endpoints.
//! - **`config`**: Cluster assembly parameters and their validation.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod nodes;
pub mod ring;
pub mod server;

#[cfg(test)]
mod test_support;

pub use config::ClusterConfig;
pub use coordinator::Coordinator;
pub use error::{ClusterError, EngineError, Result};
pub use nodes::NodeManager;
pub use ring::HashRing;
