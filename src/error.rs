//! Error types for the sharded key-value store
//!
//! Two layers: [`EngineError`] is what a single storage engine reports, and
//! [`ClusterError`] is what the management layer (NodeManager, configuration)
//! returns to its caller. A missing key or a failed compare-and-swap precondition
//! is never an error; those are ordinary results (`None`, `success = false`).

use crate::ring::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Failures reported by an individual storage engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine was explicitly closed; the handle is no longer usable.
    #[error("storage engine is closed")]
    Closed,

    /// The backend rejected the call.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// I/O error while preparing the engine location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking task running the call did not complete.
    #[error("storage task failed: {0}")]
    Task(String),
}

impl From<rocksdb::Error> for EngineError {
    fn from(err: rocksdb::Error) -> Self {
        EngineError::Backend(err.into_string())
    }
}

/// Errors returned by management calls.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node {0} already exists")]
    NodeAlreadyExists(NodeId),

    /// Opening the engine for a node failed.
    #[error("failed to open engine for node {node_id} at {}: {source}", location.display())]
    EngineOpen {
        node_id: NodeId,
        location: PathBuf,
        #[source]
        source: EngineError,
    },

    /// A call against an already registered engine failed (including close).
    #[error("engine operation failed on node {node_id}: {source}")]
    EngineOperation {
        node_id: NodeId,
        #[source]
        source: EngineError,
    },

    /// One or more engines failed to close during a full shutdown.
    #[error("failed to close {} node engine(s): {}", .0.len(), describe_failures(.0))]
    CloseFailed(Vec<(NodeId, EngineError)>),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_failures(failures: &[(NodeId, EngineError)]) -> String {
    failures
        .iter()
        .map(|(node_id, err)| format!("{}: {}", node_id, err))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_failed_lists_every_node() {
        let err = ClusterError::CloseFailed(vec![
            (NodeId::from("node1"), EngineError::Closed),
            (NodeId::from("node2"), EngineError::Backend("flush".to_string())),
        ]);

        let message = err.to_string();
        assert!(message.starts_with("failed to close 2 node engine(s)"));
        assert!(message.contains("node1: storage engine is closed"));
        assert!(message.contains("node2: storage backend error: flush"));
    }

    #[test]
    fn test_engine_open_keeps_source() {
        let err = ClusterError::EngineOpen {
            node_id: NodeId::from("node3"),
            location: PathBuf::from("/tmp/node3"),
            source: EngineError::Backend("lock held".to_string()),
        };

        assert!(err.to_string().contains("/tmp/node3"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
