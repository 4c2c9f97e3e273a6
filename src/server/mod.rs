//! Transport Module
//!
//! Exposes the coordinator over JSON/HTTP: one POST route per record operation,
//! plus node administration. Every record operation is bounded by the request
//! timeout; storage calls already issued keep running after a timeout.

pub mod handlers;
pub mod protocol;

use crate::coordinator::Coordinator;
use crate::nodes::EngineOptions;

use axum::{
    Extension, Router,
    routing::{delete, get, post},
};
use handlers::*;
use protocol::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Shared state handed to every handler.
pub struct ServerState {
    pub coordinator: Arc<Coordinator>,
    pub request_timeout: Duration,
    /// Directory under which nodes joined at runtime get their engine directory.
    pub data_dir: PathBuf,
    pub engine_options: EngineOptions,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(ENDPOINT_PUT, post(handle_put))
        .route(ENDPOINT_GET, post(handle_get))
        .route(ENDPOINT_DELETE, post(handle_delete))
        .route(ENDPOINT_UPDATE_KEY, post(handle_update_key))
        .route(ENDPOINT_UPDATE_VALUE, post(handle_update_value))
        .route(ENDPOINT_PLACEMENT, post(handle_placement))
        .route(ENDPOINT_NODES, get(handle_list_nodes).post(handle_add_node))
        .route(ENDPOINT_NODE, delete(handle_remove_node))
        .layer(Extension(state))
}

#[cfg(test)]
mod tests;
