use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::thresholds::{ThresholdInput, DEFAULT_THRESHOLDS};
use crate::{Monitor, ThresholdConfig};

// ---

pub fn router() -> Router<Monitor> {
    // ---
    Router::new()
        .route("/thresholds", get(active).put(save))
        .route("/thresholds/reset", post(reset))
}

async fn active(State(monitor): State<Monitor>) -> Json<ThresholdConfig> {
    Json(monitor.view(|s| *s.thresholds()).await)
}

/// Save the threshold form. Non-numeric fields become 0, absent ones are kept.
async fn save(
    State(monitor): State<Monitor>,
    Json(input): Json<ThresholdInput>,
) -> Json<ThresholdConfig> {
    // ---
    let current = monitor.view(|s| *s.thresholds()).await;
    let updated = input.apply(&current);
    monitor.save_thresholds(updated).await;
    info!("PUT /thresholds - saved");
    Json(updated)
}

async fn reset(State(monitor): State<Monitor>) -> Json<ThresholdConfig> {
    // ---
    monitor.save_thresholds(DEFAULT_THRESHOLDS).await;
    info!("POST /thresholds/reset - defaults restored");
    Json(DEFAULT_THRESHOLDS)
}
