use axum::Router;

use crate::Monitor;

mod alerts;
mod data;
mod forecasts;
mod health;
mod readings;
mod requests;
mod thresholds;
mod zones;

// ---

pub fn router(monitor: Monitor) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(alerts::router())
        .merge(thresholds::router())
        .merge(forecasts::router())
        .merge(zones::router())
        .merge(requests::router())
        .merge(data::router())
        .merge(health::router())
        .with_state(monitor)
}
