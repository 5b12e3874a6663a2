//! Destructive operations on the user's stored data.

use axum::{
    extract::Path, extract::State, http::StatusCode, response::IntoResponse, routing::delete,
    Json, Router,
};
use tracing::{error, info};

use crate::simulator::NODES;
use crate::Monitor;

// ---

pub fn router() -> Router<Monitor> {
    // ---
    Router::new()
        .route("/data", delete(delete_all))
        .route("/nodes/{node_id}", delete(delete_node))
}

async fn delete_all(State(monitor): State<Monitor>) -> impl IntoResponse {
    // ---
    match monitor.delete_all_data().await {
        Ok(()) => {
            info!("DELETE /data - done");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            error!("DELETE /data failed: {}", e);
            (StatusCode::BAD_GATEWAY, Json(format!("Error deleting data: {e}"))).into_response()
        }
    }
}

async fn delete_node(
    Path(node_id): Path<String>,
    State(monitor): State<Monitor>,
) -> impl IntoResponse {
    // ---
    if !NODES.contains(&node_id.as_str()) {
        return (StatusCode::NOT_FOUND, Json(format!("Unknown node: {node_id}"))).into_response();
    }

    match monitor.delete_node_data(&node_id).await {
        Ok(()) => {
            info!("DELETE /nodes/{} - done", node_id);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            error!("DELETE /nodes/{} failed: {}", node_id, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(format!("Error deleting node data: {e}")),
            )
                .into_response()
        }
    }
}
