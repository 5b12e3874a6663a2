use axum::{
    extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::models::{LatLng, Prediction, Zone};
use crate::zones::{
    find_zone, polygon_path, pollution_history, zone_forecast, PollutionSample,
    DEFAULT_POLYGON_SIZE, POLLUTION_ZONES,
};
use crate::Monitor;

// ---

pub fn router() -> Router<Monitor> {
    // ---
    Router::new()
        .route("/zones", get(list))
        .route("/zones/{zone_id}", get(detail))
}

async fn list() -> Json<&'static [Zone]> {
    Json(&POLLUTION_ZONES)
}

/// Everything the map shows when a zone is opened.
#[derive(Debug, Serialize)]
struct ZoneDetail {
    zone: &'static Zone,
    polygon: Vec<LatLng>,
    history: Vec<PollutionSample>,
    forecast: Prediction,
}

fn zone_detail(zone: &'static Zone) -> ZoneDetail {
    // ---
    let mut rng = rand::thread_rng();
    ZoneDetail {
        zone,
        polygon: polygon_path(zone.center, DEFAULT_POLYGON_SIZE),
        history: pollution_history(zone.pollution, Utc::now(), &mut rng),
        forecast: zone_forecast(zone.pollution, zone.trend, &mut rng),
    }
}

async fn detail(Path(zone_id): Path<String>) -> impl IntoResponse {
    // ---
    match find_zone(&zone_id) {
        Some(zone) => (StatusCode::OK, Json(zone_detail(zone))).into_response(),
        None => (StatusCode::NOT_FOUND, Json(format!("Unknown zone: {zone_id}"))).into_response(),
    }
}
