//! Core of the `econova-monitor` service: simulated water-quality nodes,
//! threshold alerts, danger scores, forecasts and insights, plus the
//! persistence gateway and HTTP routes that expose them.
//!
//! Module boundaries follow one rule: `routes/*` only reach the rest of the
//! crate through the re-exports below and their sibling modules, so handlers
//! stay unaware of config loading and gateway wiring.

pub mod config;
pub mod danger;
pub mod gateway;
pub mod insights;
pub mod models;
pub mod monitor;
pub mod predictor;
pub mod requests;
pub mod routes;
pub mod schema;
pub mod session;
pub mod simulator;
pub mod thresholds;
pub mod zones;

pub use config::Config;
pub use models::{Alert, Reading, ThresholdConfig};
pub use monitor::{Monitor, MonitorHandle};
pub use session::Session;
