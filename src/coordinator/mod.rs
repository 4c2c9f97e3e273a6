//! Request Coordination Module
//!
//! Composes the hash ring (placement) with the node registry (storage access) to
//! serve the five logical record operations.
//!
//! ## Operations
//! - **Put / Delete**: fanned out to every replica; per-replica failures are logged and
//!   absorbed, and the `ReplicationPolicy` judges the overall outcome.
//! - **Get**: replicas are tried in ring order and the first one holding the key wins.
//! - **UpdateKey**: get, put under the new key, delete the old key. Not atomic.
//! - **UpdateValue**: compare-and-swap built from get and put. Not isolated.
//!
//! There is no cross-replica locking, retry or read repair.

pub mod replication;
pub mod service;
pub mod types;

pub use replication::{AckMode, AtLeastOne, BestEffort, ReplicationPolicy};
pub use service::Coordinator;
pub use types::{FanoutReport, ReadOutcome, WriteOutcome};
