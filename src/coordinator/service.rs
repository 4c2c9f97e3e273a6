use super::replication::{BestEffort, ReplicationPolicy};
use super::types::{FanoutReport, ReadOutcome, WriteOutcome};
use crate::error::{ClusterError, EngineError, Result};
use crate::nodes::{EngineOptions, NodeManager};
use crate::ring::{HashRing, NodeId};

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Clone)]
enum WriteOp {
    Put(Arc<[u8]>),
    Delete,
}

impl WriteOp {
    fn verb(&self) -> &'static str {
        match self {
            WriteOp::Put(_) => "write",
            WriteOp::Delete => "delete",
        }
    }
}

/// Turns logical record operations into per-replica engine calls.
///
/// Holds no per-request state. Engine calls run on the blocking pool and are
/// spawned before they are awaited, so dropping an operation's future (for
/// example on a request timeout) never cancels a call already issued to a node.
pub struct Coordinator {
    ring: Arc<HashRing>,
    nodes: Arc<NodeManager>,
    policy: Arc<dyn ReplicationPolicy>,
}

impl Coordinator {
    pub fn new(ring: Arc<HashRing>, nodes: Arc<NodeManager>) -> Arc<Self> {
        Self::with_policy(ring, nodes, Arc::new(BestEffort))
    }

    pub fn with_policy(
        ring: Arc<HashRing>,
        nodes: Arc<NodeManager>,
        policy: Arc<dyn ReplicationPolicy>,
    ) -> Arc<Self> {
        tracing::info!("Coordinator using {} replication", policy.name());
        Arc::new(Self { ring, nodes, policy })
    }

    pub fn ring(&self) -> &Arc<HashRing> {
        &self.ring
    }

    pub fn nodes(&self) -> &Arc<NodeManager> {
        &self.nodes
    }

    /// Replica set of `key`, primary first.
    pub fn placement(&self, key: &[u8]) -> Vec<NodeId> {
        self.ring.get_nodes(key)
    }

    /// Writes `value` under `key` on every resolved replica.
    ///
    /// Replica failures are logged and skipped; whether the put counts as a
    /// success is up to the replication policy.
    pub async fn put(&self, key: &[u8], value: &[u8]) -> WriteOutcome {
        let report = self.fan_out(key, WriteOp::Put(Arc::from(value))).await;
        let success = self.policy.put_succeeded(&report);

        if report.acknowledged() == 0 {
            tracing::warn!(
                "PUT '{}': no replica acknowledged the write ({} attempted)",
                display_key(key),
                report.attempted()
            );
        }

        WriteOutcome { success, report }
    }

    /// Reads `key` from its replicas in ring order.
    ///
    /// The first replica holding the key answers; replicas are not compared.
    /// `None` if no reachable replica has it.
    pub async fn get(&self, key: &[u8]) -> Option<ReadOutcome> {
        let targets = self.ring.get_nodes(key);
        tracing::debug!("GET '{}' from nodes {:?}", display_key(key), targets);

        let shared_key: Arc<[u8]> = Arc::from(key);
        for node_id in targets {
            let engine = match self.nodes.get_db(&node_id) {
                Ok(engine) => engine,
                Err(e) => {
                    tracing::warn!("GET: failed to get engine for node {}: {}", node_id, e);
                    continue;
                }
            };

            let task_key = shared_key.clone();
            let lookup = tokio::task::spawn_blocking(move || engine.get(&task_key));
            match join(lookup).await {
                Ok(Some(value)) => {
                    tracing::debug!("GET '{}': found on node {}", display_key(key), node_id);
                    return Some(ReadOutcome {
                        value,
                        source: node_id,
                    });
                }
                Ok(None) => {
                    tracing::debug!("GET '{}': not on node {}", display_key(key), node_id);
                }
                Err(e) => {
                    tracing::warn!(
                        "GET '{}': error reading from node {}: {}",
                        display_key(key),
                        node_id,
                        e
                    );
                }
            }
        }

        None
    }

    /// Deletes `key` from every resolved replica.
    pub async fn delete(&self, key: &[u8]) -> WriteOutcome {
        let report = self.fan_out(key, WriteOp::Delete).await;
        let success = self.policy.delete_succeeded(&report);
        WriteOutcome { success, report }
    }

    /// Renames `old_key` to `new_key` as get, put, delete.
    ///
    /// Not atomic: a concurrent writer or a failure between the steps can leave
    /// the value under both keys. Fails only if `old_key` is absent or the put is
    /// not acknowledged. Renaming a key onto itself changes nothing.
    pub async fn update_key(&self, old_key: &[u8], new_key: &[u8]) -> bool {
        if old_key == new_key {
            return self.get(old_key).await.is_some();
        }

        let Some(current) = self.get(old_key).await else {
            tracing::debug!("UPDATE_KEY: source key '{}' not found", display_key(old_key));
            return false;
        };

        let written = self.put(new_key, &current.value).await;
        if !written.success {
            tracing::warn!(
                "UPDATE_KEY: put of '{}' failed, leaving '{}' in place",
                display_key(new_key),
                display_key(old_key)
            );
            return false;
        }

        let removed = self.delete(old_key).await;
        if !removed.success {
            tracing::warn!(
                "UPDATE_KEY: '{}' copied to '{}' but no replica deleted the source",
                display_key(old_key),
                display_key(new_key)
            );
        }

        true
    }

    /// Compare-and-swap: replaces the value of `key` only if it currently reads as
    /// `old_value`.
    ///
    /// Nothing guards the gap between the read and the write; two concurrent calls
    /// that read the same old value both report success and the later put wins.
    pub async fn update_value(&self, key: &[u8], old_value: &[u8], new_value: &[u8]) -> bool {
        match self.get(key).await {
            Some(current) if current.value == old_value => {}
            Some(_) => {
                tracing::debug!("UPDATE_VALUE: '{}' does not hold the expected value", display_key(key));
                return false;
            }
            None => {
                tracing::debug!("UPDATE_VALUE: '{}' not found", display_key(key));
                return false;
            }
        }

        self.put(key, new_value).await.success
    }

    /// Opens an engine for `node_id` and places the node on the ring.
    ///
    /// Existing records are not migrated to the new node.
    pub fn add_node(
        &self,
        node_id: impl Into<NodeId>,
        location: impl AsRef<Path>,
        options: &EngineOptions,
    ) -> Result<()> {
        let node_id = node_id.into();
        self.nodes
            .add_node_with_options(node_id.clone(), location, options)?;
        self.ring.add_node(node_id);
        Ok(())
    }

    /// Takes `node_id` off the ring, then closes and deregisters its engine.
    pub fn remove_node(&self, node_id: &NodeId) -> Result<()> {
        let routed = self.ring.remove_node(node_id);
        match self.nodes.remove_node(node_id) {
            Err(ClusterError::NodeNotFound(_)) if routed => Ok(()),
            other => other,
        }
    }

    /// Closes every node engine.
    pub fn shutdown(&self) -> Result<()> {
        self.nodes.close()
    }

    async fn fan_out(&self, key: &[u8], op: WriteOp) -> FanoutReport {
        let targets = self.ring.get_nodes(key);
        tracing::debug!("{} '{}' to nodes {:?}", op.verb(), display_key(key), targets);

        let shared_key: Arc<[u8]> = Arc::from(key);
        let mut pending = Vec::with_capacity(targets.len());

        for node_id in &targets {
            let engine = match self.nodes.get_db(node_id) {
                Ok(engine) => engine,
                Err(e) => {
                    tracing::warn!("Failed to get engine for node {}: {}", node_id, e);
                    continue;
                }
            };

            let task_key = shared_key.clone();
            let task_op = op.clone();
            let call = tokio::task::spawn_blocking(move || match &task_op {
                WriteOp::Put(value) => engine.put(&task_key, value),
                WriteOp::Delete => engine.delete(&task_key),
            });
            pending.push((node_id.clone(), call));
        }

        let mut acknowledged_by = Vec::with_capacity(pending.len());
        for (node_id, call) in pending {
            match join(call).await {
                Ok(()) => {
                    tracing::debug!(
                        "Successful {} of '{}' on node {}",
                        op.verb(),
                        display_key(key),
                        node_id
                    );
                    acknowledged_by.push(node_id);
                }
                Err(e) => {
                    tracing::warn!(
                        "Error during {} of '{}' on node {}: {}",
                        op.verb(),
                        display_key(key),
                        node_id,
                        e
                    );
                }
            }
        }

        FanoutReport {
            targets,
            acknowledged_by,
        }
    }
}

async fn join<T>(call: JoinHandle<std::result::Result<T, EngineError>>) -> std::result::Result<T, EngineError> {
    call.await.map_err(|e| EngineError::Task(e.to_string()))?
}

fn display_key(key: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(key)
}
