// src/routes/health.rs
//! Health check endpoint for the monitoring service.
//!
//! `/health` is used by container orchestrators and CI to confirm the
//! service answers HTTP and to see which persistence backend it runs on.
//! Following the routes gateway layout:
//! - Internal to this file: endpoint handler and its response type
//! - Exports to the gateway (`mod.rs`): a subrouter containing `/health`

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::Monitor;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
    /// Nodes currently holding a live reading.
    live_nodes: usize,
}

/// Handle `GET /health`.
///
/// Only inspects in-memory state; never touches the persistence backend.
async fn health(State(monitor): State<Monitor>) -> Json<HealthResponse> {
    // ---
    let live_nodes = monitor.view(|s| s.current().len()).await;
    Json(HealthResponse {
        status: "ok",
        backend: monitor.backend(),
        live_nodes,
    })
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<Monitor> {
    Router::new().route("/health", get(health))
}
