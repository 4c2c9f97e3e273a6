//! Placement Module
//!
//! Maps keys to the physical nodes that own them using consistent hashing.
//!
//! ## Core Concepts
//! - **Virtual Nodes**: Each physical node is placed on the ring `replicas` times, at the
//!   CRC32 hash of `"<node_id>#<index>"`, to smooth the key distribution.
//! - **Placement**: A key is owned by the first distinct physical nodes found walking the
//!   ring clockwise from the key's own hash, up to the replication factor.
//! - **Topology Changes**: Adding or removing a node swaps in a rebuilt position list under
//!   an exclusive lock; readers never observe a half-applied change. Records are not migrated.

pub mod hashring;
pub mod types;

pub use hashring::{HashRing, REPLICATION_FACTOR, hash_key};
pub use types::{NodeId, VirtualNode};
