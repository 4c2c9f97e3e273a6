//! Client Protocol
//!
//! API endpoints and Data Transfer Objects for the five record operations and the
//! node administration calls. Bodies are JSON; keys and values travel as strings.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

pub const ENDPOINT_PUT: &str = "/put";
pub const ENDPOINT_GET: &str = "/get";
pub const ENDPOINT_DELETE: &str = "/delete";
/// Renames a key (get, put under the new key, delete the old one).
pub const ENDPOINT_UPDATE_KEY: &str = "/update_key";
/// Compare-and-swap on a key's value.
pub const ENDPOINT_UPDATE_VALUE: &str = "/update_value";
/// Lists (GET) or joins (POST) nodes.
pub const ENDPOINT_NODES: &str = "/nodes";
/// Removes a node: `DELETE /nodes/:node_id`.
pub const ENDPOINT_NODE: &str = "/nodes/:node_id";
/// Resolves the replica set of a key.
pub const ENDPOINT_PLACEMENT: &str = "/placement";

// --- Record Operations ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetRequest {
    pub key: String,
}

/// `value` is empty when `found` is false.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub value: String,
    pub found: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

/// `success` is true if at least one replica deleted the key.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateKeyRequest {
    pub old_key: String,
    pub new_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateKeyResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateValueRequest {
    pub key: String,
    pub old_value: String,
    pub new_value: String,
}

/// `success` is false when the key is missing or holds a different value.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateValueResponse {
    pub success: bool,
}

// --- Administration ---

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesResponse {
    /// Nodes placed on the hash ring, sorted.
    pub ring: Vec<String>,
    /// Nodes with a registered storage engine, sorted.
    pub registered: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddNodeRequest {
    pub node_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeAdminResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlacementResponse {
    /// Replica set, primary first.
    pub nodes: Vec<String>,
}
