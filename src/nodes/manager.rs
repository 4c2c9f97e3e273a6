//! Node Registry
//!
//! Owns the storage engine of every physical node, keyed by node id. This is the
//! only place in the routing core that opens or closes engines; callers borrow
//! shared handles through [`NodeManager::get_db`] and must never close them.

use super::engine::{EngineFactory, EngineOptions, StorageEngine};
use crate::error::{ClusterError, Result};
use crate::ring::NodeId;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Thread-safe registry of per-node storage engines.
///
/// Registration, removal, replacement and shutdown hold the topology write lock for
/// the whole open/close; lookups share its read lock. A lookup never sees a node
/// half-registered, and nothing can register while `close` is draining the registry.
pub struct NodeManager {
    instances: DashMap<NodeId, Arc<dyn StorageEngine>>,
    topology: RwLock<()>,
    factory: Arc<dyn EngineFactory>,
    default_options: EngineOptions,
}

impl NodeManager {
    /// Creates an empty registry opening engines through `factory`.
    pub fn new(factory: Arc<dyn EngineFactory>) -> Arc<Self> {
        Self::with_options(factory, EngineOptions::default())
    }

    pub fn with_options(factory: Arc<dyn EngineFactory>, default_options: EngineOptions) -> Arc<Self> {
        Arc::new(Self {
            instances: DashMap::new(),
            topology: RwLock::new(()),
            factory,
            default_options,
        })
    }

    /// Opens an engine at `location` with the registry's default options and
    /// registers it under `node_id`.
    pub fn add_node(&self, node_id: impl Into<NodeId>, location: impl AsRef<Path>) -> Result<()> {
        let options = self.default_options.clone();
        self.add_node_with_options(node_id, location, &options)
    }

    /// Opens an engine at `location` and registers it under `node_id`.
    ///
    /// # Returns
    /// * `Err(NodeAlreadyExists)` if the id is taken; nothing is opened.
    /// * `Err(EngineOpen)` if the engine could not be opened; nothing is registered.
    pub fn add_node_with_options(
        &self,
        node_id: impl Into<NodeId>,
        location: impl AsRef<Path>,
        options: &EngineOptions,
    ) -> Result<()> {
        let node_id = node_id.into();
        let location = location.as_ref();
        let _topology = self.topology.write();

        match self.instances.entry(node_id.clone()) {
            Entry::Occupied(_) => Err(ClusterError::NodeAlreadyExists(node_id)),
            Entry::Vacant(slot) => {
                let engine = self.open_engine(&node_id, location, options)?;
                slot.insert(engine);
                tracing::info!(
                    "Added node {} with {} engine at {}",
                    node_id,
                    self.factory.name(),
                    location.display()
                );
                Ok(())
            }
        }
    }

    /// Returns the shared engine handle of `node_id`.
    pub fn get_db(&self, node_id: &NodeId) -> Result<Arc<dyn StorageEngine>> {
        let _topology = self.topology.read();
        self.instances
            .get(node_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ClusterError::NodeNotFound(node_id.clone()))
    }

    /// Closes the engine of `node_id` and deregisters it.
    ///
    /// The node is deregistered even when closing fails; the close failure is
    /// reported as `EngineOperation`.
    pub fn remove_node(&self, node_id: &NodeId) -> Result<()> {
        let _topology = self.topology.write();
        let Entry::Occupied(entry) = self.instances.entry(node_id.clone()) else {
            return Err(ClusterError::NodeNotFound(node_id.clone()));
        };

        let closed = entry.get().close();
        entry.remove();

        match closed {
            Ok(()) => {
                tracing::info!("Removed node {}", node_id);
                Ok(())
            }
            Err(source) => {
                tracing::error!("Removed node {} but closing its engine failed: {}", node_id, source);
                Err(ClusterError::EngineOperation {
                    node_id: node_id.clone(),
                    source,
                })
            }
        }
    }

    /// Swaps the engine of `node_id` for a new one at `new_location`.
    pub fn replace_node(&self, node_id: impl Into<NodeId>, new_location: impl AsRef<Path>) -> Result<()> {
        let options = self.default_options.clone();
        self.replace_node_with_options(node_id, new_location, &options)
    }

    /// Swaps the engine of `node_id` for a new one at `new_location`.
    ///
    /// The current engine, if any, is closed first; a failure to close it is only
    /// logged. If the new engine then fails to open, the old (now closed) handle
    /// stays registered and every call through it fails until the node is replaced
    /// again or removed.
    pub fn replace_node_with_options(
        &self,
        node_id: impl Into<NodeId>,
        new_location: impl AsRef<Path>,
        options: &EngineOptions,
    ) -> Result<()> {
        let node_id = node_id.into();
        let new_location = new_location.as_ref();
        let _topology = self.topology.write();

        match self.instances.entry(node_id.clone()) {
            Entry::Occupied(mut entry) => {
                if let Err(e) = entry.get().close() {
                    tracing::warn!("Failed to close existing engine for node {}: {}", node_id, e);
                }
                let engine = self.open_engine(&node_id, new_location, options)?;
                entry.insert(engine);
            }
            Entry::Vacant(slot) => {
                let engine = self.open_engine(&node_id, new_location, options)?;
                slot.insert(engine);
            }
        }

        tracing::info!(
            "Replaced engine for node {} with new location {}",
            node_id,
            new_location.display()
        );
        Ok(())
    }

    /// Returns a list of all registered node ids.
    pub fn list_nodes(&self) -> Vec<NodeId> {
        self.instances.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn node_exists(&self, node_id: &NodeId) -> bool {
        self.instances.contains_key(node_id)
    }

    pub fn node_count(&self) -> usize {
        self.instances.len()
    }

    /// Where the engine of `node_id` lives.
    pub fn location(&self, node_id: &NodeId) -> Result<PathBuf> {
        self.get_db(node_id).map(|engine| engine.location().to_path_buf())
    }

    /// Closes every registered engine and empties the registry.
    ///
    /// All nodes are deregistered even if some fail to close; those failures are
    /// returned together as `CloseFailed`.
    pub fn close(&self) -> Result<()> {
        let _topology = self.topology.write();
        let node_ids = self.list_nodes();
        let mut failures = Vec::new();

        for node_id in node_ids {
            let Some((node_id, engine)) = self.instances.remove(&node_id) else {
                continue;
            };
            match engine.close() {
                Ok(()) => tracing::info!("Closed engine for node {}", node_id),
                Err(e) => {
                    tracing::error!("Failed to close engine for node {}: {}", node_id, e);
                    failures.push((node_id, e));
                }
            }
        }

        if failures.is_empty() {
            tracing::info!("All node engines closed");
            Ok(())
        } else {
            Err(ClusterError::CloseFailed(failures))
        }
    }

    fn open_engine(
        &self,
        node_id: &NodeId,
        location: &Path,
        options: &EngineOptions,
    ) -> Result<Arc<dyn StorageEngine>> {
        self.factory
            .open(location, options)
            .map_err(|source| ClusterError::EngineOpen {
                node_id: node_id.clone(),
                location: location.to_path_buf(),
                source,
            })
    }
}
