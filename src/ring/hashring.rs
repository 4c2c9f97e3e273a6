use super::types::{NodeId, VirtualNode};
use parking_lot::RwLock;
use std::collections::HashSet;

/// Maximum number of distinct physical nodes in a key's replica set.
pub const REPLICATION_FACTOR: usize = 3;

/// Ring hash: CRC32 (IEEE) over the key bytes.
///
/// Used both for virtual node labels and for lookup keys, so the two always agree.
pub fn hash_key(key: &[u8]) -> u32 {
    crc32fast::hash(key)
}

#[derive(Debug, Default)]
struct RingState {
    /// Sorted ascending by `(position, node_id)`.
    positions: Vec<VirtualNode>,
    nodes: HashSet<NodeId>,
}

/// Consistent-hash ring with virtual replicas.
///
/// Pure placement logic: no I/O, no knowledge of storage. All methods take `&self`;
/// topology changes take the write lock, lookups share the read lock.
pub struct HashRing {
    replicas: usize,
    replication_factor: usize,
    state: RwLock<RingState>,
}

impl HashRing {
    /// Creates an empty ring placing `replicas` virtual nodes per physical node.
    pub fn new(replicas: usize) -> Self {
        Self::with_replication_factor(replicas, REPLICATION_FACTOR)
    }

    pub fn with_replication_factor(replicas: usize, replication_factor: usize) -> Self {
        Self {
            replicas: replicas.max(1),
            replication_factor: replication_factor.max(1),
            state: RwLock::new(RingState::default()),
        }
    }

    /// Registers a physical node. Re-adding a present node is a no-op.
    ///
    /// Returns `true` if the node was newly added.
    pub fn add_node(&self, node_id: impl Into<NodeId>) -> bool {
        let node_id = node_id.into();
        let mut state = self.state.write();

        if state.nodes.contains(&node_id) {
            tracing::debug!("Ring already contains node {}", node_id);
            return false;
        }

        let mut positions = Vec::with_capacity(state.positions.len() + self.replicas);
        positions.extend(state.positions.iter().cloned());
        positions.extend((0..self.replicas).map(|index| VirtualNode {
            position: hash_key(node_id.virtual_label(index).as_bytes()),
            node_id: node_id.clone(),
        }));
        positions.sort_unstable();

        state.positions = positions;
        state.nodes.insert(node_id.clone());

        tracing::info!(
            "Added node {} to ring ({} virtual nodes, {} total positions)",
            node_id,
            self.replicas,
            state.positions.len()
        );
        true
    }

    /// Removes a physical node and all of its virtual positions. Removing an absent
    /// node is a no-op.
    ///
    /// Returns `true` if the node was present.
    pub fn remove_node(&self, node_id: &NodeId) -> bool {
        let mut state = self.state.write();

        if !state.nodes.remove(node_id) {
            tracing::debug!("Ring does not contain node {}", node_id);
            return false;
        }

        let positions: Vec<VirtualNode> = state
            .positions
            .iter()
            .filter(|vnode| &vnode.node_id != node_id)
            .cloned()
            .collect();
        state.positions = positions;

        tracing::info!(
            "Removed node {} from ring ({} positions remain)",
            node_id,
            state.positions.len()
        );
        true
    }

    /// Resolves the replica set for `key`, primary first.
    ///
    /// Walks clockwise from the first position `>=` the key's hash (wrapping to the
    /// start), skipping positions of nodes already collected, until the replication
    /// factor is reached or the ring is exhausted. Empty iff the ring is empty.
    pub fn get_nodes(&self, key: impl AsRef<[u8]>) -> Vec<NodeId> {
        let state = self.state.read();
        let positions = &state.positions;

        if positions.is_empty() {
            return Vec::new();
        }

        let hash = hash_key(key.as_ref());
        let len = positions.len();
        let mut start = positions.partition_point(|vnode| vnode.position < hash);
        if start == len {
            start = 0;
        }

        let wanted = self.replication_factor.min(state.nodes.len());
        let mut owners: Vec<NodeId> = Vec::with_capacity(wanted);
        for offset in 0..len {
            if owners.len() >= wanted {
                break;
            }
            let vnode = &positions[(start + offset) % len];
            if !owners.contains(&vnode.node_id) {
                owners.push(vnode.node_id.clone());
            }
        }

        owners
    }

    /// Snapshot of registered physical nodes, in no particular order.
    pub fn get_all_nodes(&self) -> Vec<NodeId> {
        self.state.read().nodes.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().nodes.is_empty()
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.state.read().nodes.contains(node_id)
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    /// Total number of virtual positions on the ring.
    pub fn position_count(&self) -> usize {
        self.state.read().positions.len()
    }

    /// Ring positions owned by `node_id`, ascending.
    pub fn node_positions(&self, node_id: &NodeId) -> Vec<u32> {
        self.state
            .read()
            .positions
            .iter()
            .filter(|vnode| &vnode.node_id == node_id)
            .map(|vnode| vnode.position)
            .collect()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }
}
