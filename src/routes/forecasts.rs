//! Derived views: predictions, insights and danger scores.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::danger::DangerLevel;
use crate::models::{LatLng, NodePrediction};
use crate::simulator::node_coordinates;
use crate::Monitor;

// ---

pub fn router() -> Router<Monitor> {
    // ---
    Router::new()
        .route("/predictions", get(predictions))
        .route("/insights", get(insights))
        .route("/danger", get(danger))
}

async fn predictions(State(monitor): State<Monitor>) -> Json<Vec<NodePrediction>> {
    Json(monitor.view(|s| s.predictions().to_vec()).await)
}

async fn insights(State(monitor): State<Monitor>) -> Json<Vec<&'static str>> {
    Json(monitor.view(|s| s.insights().to_vec()).await)
}

/// Map marker for one node.
#[derive(Debug, Serialize)]
struct NodeDanger {
    node_id: String,
    score: u8,
    level: DangerLevel,
    color: &'static str,
    location: LatLng,
}

async fn danger(State(monitor): State<Monitor>) -> Json<Vec<NodeDanger>> {
    // ---
    let scores = monitor.view(|s| s.danger_scores()).await;
    let markers = scores
        .into_iter()
        .map(|(node_id, score)| {
            let level = DangerLevel::from_score(score);
            NodeDanger {
                location: node_coordinates(&node_id),
                node_id,
                score,
                level,
                color: level.color(),
            }
        })
        .collect();
    Json(markers)
}
