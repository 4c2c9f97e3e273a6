use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique identifier of a physical node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids name the node's engine directory and prefix its virtual labels, so they
    /// must be a single non-blank path component without the `#` label separator.
    pub fn is_valid(&self) -> bool {
        let id = self.0.as_str();
        !id.trim().is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', '#'])
    }

    /// Label hashed to place the `index`-th virtual node of this physical node.
    pub fn virtual_label(&self, index: usize) -> String {
        format!("{}#{}", self.0, index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single position on the ring, owned by a physical node.
///
/// Ordering is by `position` first, then by owner, so two virtual nodes that collide on
/// the same hash still sort deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtualNode {
    pub position: u32,
    pub node_id: NodeId,
}
