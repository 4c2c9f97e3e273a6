//! Cluster Configuration
//!
//! Everything the binary needs to assemble a cluster. There is no configuration
//! file: fields come from command-line flags or their environment fallbacks.

use crate::coordinator::AckMode;
use crate::error::{ClusterError, Result};
use crate::nodes::{EngineKind, EngineOptions};
use crate::ring::NodeId;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NODE_COUNT: usize = 5;
pub const DEFAULT_DATA_DIR: &str = "dbs";
pub const DEFAULT_VIRTUAL_REPLICAS: usize = 3;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:50051";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub node_ids: Vec<NodeId>,
    /// Each node's engine lives in a sub-directory named after the node.
    pub data_dir: PathBuf,
    pub virtual_replicas: usize,
    pub replication_factor: usize,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub engine: EngineKind,
    pub ack_mode: AckMode,
    pub engine_options: EngineOptions,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_ids: (1..=DEFAULT_NODE_COUNT)
                .map(|i| NodeId(format!("node{}", i)))
                .collect(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            virtual_replicas: DEFAULT_VIRTUAL_REPLICAS,
            replication_factor: crate::ring::REPLICATION_FACTOR,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 50051)),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            engine: EngineKind::Rocksdb,
            ack_mode: AckMode::BestEffort,
            engine_options: EngineOptions::default(),
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.node_ids.is_empty() {
            return Err(ClusterError::Config("at least one node id is required".into()));
        }

        let mut seen = HashSet::with_capacity(self.node_ids.len());
        for node_id in &self.node_ids {
            if !node_id.is_valid() {
                return Err(ClusterError::Config(format!("invalid node id {:?}", node_id.as_str())));
            }
            if !seen.insert(node_id) {
                return Err(ClusterError::Config(format!("duplicate node id '{}'", node_id)));
            }
        }

        if self.virtual_replicas == 0 {
            return Err(ClusterError::Config("virtual replicas must be at least 1".into()));
        }
        if self.replication_factor == 0 {
            return Err(ClusterError::Config("replication factor must be at least 1".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ClusterError::Config("request timeout must be non-zero".into()));
        }

        Ok(())
    }

    pub fn node_location(&self, node_id: &NodeId) -> PathBuf {
        self.data_dir.join(node_id.as_str())
    }
}
