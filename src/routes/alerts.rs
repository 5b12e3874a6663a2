use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::info;

use crate::{Alert, Monitor};

// ---

pub fn router() -> Router<Monitor> {
    Router::new().route("/alerts", get(list).delete(clear))
}

/// Rolling alert buffer, newest first.
async fn list(State(monitor): State<Monitor>) -> Json<Vec<Alert>> {
    Json(monitor.view(|s| s.alerts()).await)
}

async fn clear(State(monitor): State<Monitor>) -> StatusCode {
    // ---
    monitor.clear_alerts().await;
    info!("DELETE /alerts - alert buffer cleared");
    StatusCode::NO_CONTENT
}
