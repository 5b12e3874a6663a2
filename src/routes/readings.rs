use axum::{
    extract::Path, extract::Query, extract::State, http::StatusCode, response::IntoResponse,
    routing::get, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::ParameterAverages;
use crate::simulator::NODES;
use crate::{Monitor, Reading};

// ---

pub fn router() -> Router<Monitor> {
    // ---
    Router::new()
        .route("/readings", get(current))
        .route("/readings/history", get(live_history))
        .route("/readings/summary", get(summary))
        .route("/nodes/{node_id}/history", get(stored_history))
}

/// Latest reading of every node, in catalog order.
async fn current(State(monitor): State<Monitor>) -> Json<Vec<Reading>> {
    // ---
    let readings = monitor
        .view(|s| s.current().values().cloned().collect::<Vec<_>>())
        .await;
    debug!("GET /readings - {} nodes", readings.len());
    Json(readings)
}

/// Per-parameter averages across the node catalog.
async fn summary(State(monitor): State<Monitor>) -> Json<ParameterAverages> {
    Json(monitor.view(|s| s.averages()).await)
}

/// Rolling in-memory history, optionally filtered.
async fn live_history(
    Query(params): Query<ReadingsQuery>,
    State(monitor): State<Monitor>,
) -> impl IntoResponse {
    // ---
    let readings = monitor
        .view(|s| {
            NODES
                .iter()
                .flat_map(|node_id| s.history(node_id))
                .collect::<Vec<_>>()
        })
        .await;

    match apply_filters(readings, &params) {
        Ok(filtered) => {
            info!("GET /readings/history - returning {} readings", filtered.len());
            (StatusCode::OK, Json(filtered)).into_response()
        }
        Err(msg) => (StatusCode::BAD_REQUEST, Json(msg)).into_response(),
    }
}

/// History previously written to the persistence backend.
///
/// A store that cannot be read yields an empty list, same as "no data yet".
async fn stored_history(
    Path(node_id): Path<String>,
    State(monitor): State<Monitor>,
) -> impl IntoResponse {
    // ---
    if !NODES.contains(&node_id.as_str()) {
        return (StatusCode::NOT_FOUND, Json(format!("Unknown node: {node_id}"))).into_response();
    }

    let history = monitor.load_history(&node_id).await;
    info!("GET /nodes/{}/history - {} stored readings", node_id, history.len());
    (StatusCode::OK, Json(history)).into_response()
}

// ---

/// Query parameters for filtering readings
#[derive(Debug, Default, Deserialize)]
pub struct ReadingsQuery {
    node_id: Option<String>,
    /// Timestamp range filter (e.g., "2025-03-21T00:00:00Z,2025-03-22T00:00:00Z")
    timestamp_range: Option<String>,
    limit: Option<u32>,
}

fn parse_range(range: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
    // ---
    let (start, end) = range
        .split_once(',')
        .ok_or_else(|| format!("timestamp_range must be 'start,end', got {range:?}"))?;

    let parse = |s: &str| {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| format!("Invalid timestamp {s:?}: {e}"))
    };
    Ok((parse(start)?, parse(end)?))
}

/// Apply query filters to readings
fn apply_filters(readings: Vec<Reading>, params: &ReadingsQuery) -> Result<Vec<Reading>, String> {
    // ---
    debug!("Apply filter: {:?}", params);
    let range = params.timestamp_range.as_deref().map(parse_range).transpose()?;

    Ok(readings
        .into_iter()
        .filter(|r| params.node_id.as_ref().map_or(true, |id| &r.node_id == id))
        .filter(|r| range.map_or(true, |(start, end)| r.timestamp >= start && r.timestamp <= end))
        .take(params.limit.unwrap_or(1000) as usize)
        .collect())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn reading(node_id: &str, hour: u32) -> Reading {
        // ---
        Reading {
            node_id: node_id.to_string(),
            ph: 7.0,
            turbidity: 50.0,
            flow: 100.0,
            temperature: 25.0,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 21, hour, 0, 0).unwrap(),
        }
    }

    fn sample() -> Vec<Reading> {
        vec![
            reading("Node_A", 1),
            reading("Node_B", 2),
            reading("Node_A", 3),
            reading("Node_B", 4),
        ]
    }

    #[test]
    fn test_filter_by_node_and_limit() {
        // ---
        let params = ReadingsQuery {
            node_id: Some("Node_A".into()),
            limit: Some(1),
            ..Default::default()
        };
        let filtered = apply_filters(sample(), &params).unwrap();
        assert_eq!(filtered, vec![reading("Node_A", 1)]);
    }

    #[test]
    fn test_filter_by_timestamp_range() {
        // ---
        let params = ReadingsQuery {
            timestamp_range: Some("2025-03-21T02:00:00Z, 2025-03-21T03:00:00Z".into()),
            ..Default::default()
        };
        let filtered = apply_filters(sample(), &params).unwrap();
        assert_eq!(filtered, vec![reading("Node_B", 2), reading("Node_A", 3)]);
    }

    #[test]
    fn test_bad_timestamp_range_is_rejected() {
        // ---
        let params = ReadingsQuery {
            timestamp_range: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(apply_filters(sample(), &params).is_err());

        let params = ReadingsQuery {
            timestamp_range: Some("2025-03-21T02:00:00Z,later".into()),
            ..Default::default()
        };
        assert!(apply_filters(sample(), &params).is_err());
    }
}
