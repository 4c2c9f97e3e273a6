use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::ServerState;
use super::protocol::{
    AddNodeRequest, DeleteRequest, DeleteResponse, GetRequest, GetResponse, NodeAdminResponse,
    NodesResponse, PlacementRequest, PlacementResponse, PutRequest, PutResponse, UpdateKeyRequest,
    UpdateKeyResponse, UpdateValueRequest, UpdateValueResponse,
};
use crate::error::ClusterError;
use crate::ring::NodeId;

pub async fn handle_put(
    Extension(state): Extension<Arc<ServerState>>,
    Json(req): Json<PutRequest>,
) -> (StatusCode, Json<PutResponse>) {
    let span = tracing::info_span!("put", request_id = %Uuid::new_v4(), key = %req.key);
    async move {
        let operation = state.coordinator.put(req.key.as_bytes(), req.value.as_bytes());
        match tokio::time::timeout(state.request_timeout, operation).await {
            Ok(outcome) => {
                tracing::info!(
                    "Stored on {}/{} replicas",
                    outcome.report.acknowledged(),
                    outcome.report.attempted()
                );
                (StatusCode::OK, Json(PutResponse { success: outcome.success }))
            }
            Err(_) => {
                tracing::warn!("PUT timed out after {:?}", state.request_timeout);
                (StatusCode::GATEWAY_TIMEOUT, Json(PutResponse { success: false }))
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn handle_get(
    Extension(state): Extension<Arc<ServerState>>,
    Json(req): Json<GetRequest>,
) -> (StatusCode, Json<GetResponse>) {
    let span = tracing::info_span!("get", request_id = %Uuid::new_v4(), key = %req.key);
    async move {
        let operation = state.coordinator.get(req.key.as_bytes());
        match tokio::time::timeout(state.request_timeout, operation).await {
            Ok(Some(read)) => (
                StatusCode::OK,
                Json(GetResponse {
                    value: String::from_utf8_lossy(&read.value).into_owned(),
                    found: true,
                }),
            ),
            Ok(None) => (
                StatusCode::OK,
                Json(GetResponse {
                    value: String::new(),
                    found: false,
                }),
            ),
            Err(_) => {
                tracing::warn!("GET timed out after {:?}", state.request_timeout);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    Json(GetResponse {
                        value: String::new(),
                        found: false,
                    }),
                )
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn handle_delete(
    Extension(state): Extension<Arc<ServerState>>,
    Json(req): Json<DeleteRequest>,
) -> (StatusCode, Json<DeleteResponse>) {
    let span = tracing::info_span!("delete", request_id = %Uuid::new_v4(), key = %req.key);
    async move {
        let operation = state.coordinator.delete(req.key.as_bytes());
        match tokio::time::timeout(state.request_timeout, operation).await {
            Ok(outcome) => (StatusCode::OK, Json(DeleteResponse { success: outcome.success })),
            Err(_) => {
                tracing::warn!("DELETE timed out after {:?}", state.request_timeout);
                (StatusCode::GATEWAY_TIMEOUT, Json(DeleteResponse { success: false }))
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn handle_update_key(
    Extension(state): Extension<Arc<ServerState>>,
    Json(req): Json<UpdateKeyRequest>,
) -> (StatusCode, Json<UpdateKeyResponse>) {
    let span = tracing::info_span!(
        "update_key",
        request_id = %Uuid::new_v4(),
        old_key = %req.old_key,
        new_key = %req.new_key
    );
    async move {
        let operation = state
            .coordinator
            .update_key(req.old_key.as_bytes(), req.new_key.as_bytes());
        match tokio::time::timeout(state.request_timeout, operation).await {
            Ok(success) => (StatusCode::OK, Json(UpdateKeyResponse { success })),
            Err(_) => {
                tracing::warn!("UPDATE_KEY timed out after {:?}", state.request_timeout);
                (StatusCode::GATEWAY_TIMEOUT, Json(UpdateKeyResponse { success: false }))
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn handle_update_value(
    Extension(state): Extension<Arc<ServerState>>,
    Json(req): Json<UpdateValueRequest>,
) -> (StatusCode, Json<UpdateValueResponse>) {
    let span = tracing::info_span!("update_value", request_id = %Uuid::new_v4(), key = %req.key);
    async move {
        let operation = state.coordinator.update_value(
            req.key.as_bytes(),
            req.old_value.as_bytes(),
            req.new_value.as_bytes(),
        );
        match tokio::time::timeout(state.request_timeout, operation).await {
            Ok(success) => (StatusCode::OK, Json(UpdateValueResponse { success })),
            Err(_) => {
                tracing::warn!("UPDATE_VALUE timed out after {:?}", state.request_timeout);
                (StatusCode::GATEWAY_TIMEOUT, Json(UpdateValueResponse { success: false }))
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn handle_placement(
    Extension(state): Extension<Arc<ServerState>>,
    Json(req): Json<PlacementRequest>,
) -> (StatusCode, Json<PlacementResponse>) {
    let nodes = state
        .coordinator
        .placement(req.key.as_bytes())
        .into_iter()
        .map(|node| node.0)
        .collect();

    (StatusCode::OK, Json(PlacementResponse { nodes }))
}

pub async fn handle_list_nodes(
    Extension(state): Extension<Arc<ServerState>>,
) -> (StatusCode, Json<NodesResponse>) {
    let mut ring: Vec<String> = state
        .coordinator
        .ring()
        .get_all_nodes()
        .into_iter()
        .map(|node| node.0)
        .collect();
    let mut registered: Vec<String> = state
        .coordinator
        .nodes()
        .list_nodes()
        .into_iter()
        .map(|node| node.0)
        .collect();
    ring.sort();
    registered.sort();

    (StatusCode::OK, Json(NodesResponse { ring, registered }))
}

pub async fn handle_add_node(
    Extension(state): Extension<Arc<ServerState>>,
    Json(req): Json<AddNodeRequest>,
) -> (StatusCode, Json<NodeAdminResponse>) {
    let node_id = NodeId::from(req.node_id);
    if !node_id.is_valid() {
        tracing::error!("Rejected node id {:?}", node_id.as_str());
        return admin_failure(StatusCode::BAD_REQUEST, format!("invalid node id: {:?}", node_id.as_str()));
    }

    let location = state.data_dir.join(node_id.as_str());
    let coordinator = state.coordinator.clone();
    let options = state.engine_options.clone();

    let joined =
        tokio::task::spawn_blocking(move || coordinator.add_node(node_id, location, &options)).await;

    match joined {
        Ok(Ok(())) => (
            StatusCode::CREATED,
            Json(NodeAdminResponse {
                success: true,
                error: None,
            }),
        ),
        Ok(Err(e)) => {
            tracing::error!("Failed to add node: {}", e);
            admin_failure(status_for(&e), e.to_string())
        }
        Err(e) => {
            tracing::error!("Add node task failed: {}", e);
            admin_failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn handle_remove_node(
    Extension(state): Extension<Arc<ServerState>>,
    Path(node_id): Path<String>,
) -> (StatusCode, Json<NodeAdminResponse>) {
    let node_id = NodeId::from(node_id);
    let coordinator = state.coordinator.clone();

    let left = tokio::task::spawn_blocking(move || coordinator.remove_node(&node_id)).await;

    match left {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(NodeAdminResponse {
                success: true,
                error: None,
            }),
        ),
        Ok(Err(e)) => {
            tracing::error!("Failed to remove node: {}", e);
            admin_failure(status_for(&e), e.to_string())
        }
        Err(e) => {
            tracing::error!("Remove node task failed: {}", e);
            admin_failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn admin_failure(status: StatusCode, error: String) -> (StatusCode, Json<NodeAdminResponse>) {
    (
        status,
        Json(NodeAdminResponse {
            success: false,
            error: Some(error),
        }),
    )
}

fn status_for(err: &ClusterError) -> StatusCode {
    match err {
        ClusterError::NodeNotFound(_) => StatusCode::NOT_FOUND,
        ClusterError::NodeAlreadyExists(_) => StatusCode::CONFLICT,
        ClusterError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
