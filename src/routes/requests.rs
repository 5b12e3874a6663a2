use axum::{extract::Query, extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::danger::DangerLevel;
use crate::requests::{select, PollutionRequest, SortOrder, TypeFilter};
use crate::Monitor;

// ---

pub fn router() -> Router<Monitor> {
    Router::new().route("/requests", get(list))
}

/// Query parameters for the report list
#[derive(Debug, Default, Deserialize)]
pub struct RequestsQuery {
    #[serde(rename = "type", default)]
    kind: TypeFilter,
    #[serde(default)]
    sort: SortOrder,
}

#[derive(Debug, Serialize)]
struct RequestView {
    #[serde(flatten)]
    request: PollutionRequest,
    level: DangerLevel,
    color: &'static str,
}

/// Citizen reports, filtered by pollution type and ordered by recency or danger.
async fn list(
    Query(params): Query<RequestsQuery>,
    State(monitor): State<Monitor>,
) -> Json<Vec<RequestView>> {
    // ---
    let requests = select(monitor.load_requests().await, params.kind, params.sort);
    info!("GET /requests - {:?} returning {} reports", params, requests.len());

    Json(
        requests
            .into_iter()
            .map(|request| {
                let level = request.level();
                RequestView {
                    request,
                    level,
                    color: level.color(),
                }
            })
            .collect(),
    )
}
