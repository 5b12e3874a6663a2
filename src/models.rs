//! Data models shared by the simulator, evaluator and presentation layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// One synthetic sample for a node. Superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    pub node_id: String,
    #[serde(rename = "pH")]
    pub ph: f64,
    /// NTU
    pub turbidity: f64,
    /// L/min
    pub flow: f64,
    /// °C
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

/// Measured quantity an alert or prediction refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "pH")]
    Ph,
    Turbidity,
    Flow,
    Temperature,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::Ph,
        Parameter::Turbidity,
        Parameter::Flow,
        Parameter::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Turbidity => "Turbidity",
            Parameter::Flow => "Flow",
            Parameter::Temperature => "Temperature",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// A threshold breach derived from one reading. Session memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    // ---
    pub id: Uuid,
    pub node_id: String,
    pub parameter: Parameter,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeLimit {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxLimit {
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinLimit {
    pub min: f64,
}

/// Active alert bounds. Replaced wholesale on save.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    // ---
    #[serde(rename = "pH")]
    pub ph: RangeLimit,
    pub turbidity: MaxLimit,
    pub flow: MinLimit,
    pub temperature: MaxLimit,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        crate::thresholds::DEFAULT_THRESHOLDS
    }
}

/// Current value with its 1h and 6h forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub current: f64,
    #[serde(rename = "pred1h")]
    pub pred_1h: f64,
    #[serde(rename = "pred6h")]
    pub pred_6h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterPredictions {
    #[serde(rename = "pH")]
    pub ph: Prediction,
    pub turbidity: Prediction,
    pub flow: Prediction,
    pub temperature: Prediction,
}

impl ParameterPredictions {
    pub fn get(&self, parameter: Parameter) -> &Prediction {
        match parameter {
            Parameter::Ph => &self.ph,
            Parameter::Turbidity => &self.turbidity,
            Parameter::Flow => &self.flow,
            Parameter::Temperature => &self.temperature,
        }
    }
}

/// Dashboard summary: each parameter averaged across the node catalog, to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterAverages {
    #[serde(rename = "pH")]
    pub ph: f64,
    pub turbidity: f64,
    pub flow: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePrediction {
    pub node_id: String,
    pub predictions: ParameterPredictions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneLevel {
    Moderate,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

/// Static map region with a precomputed pollution level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Zone {
    // ---
    pub id: &'static str,
    pub name: &'static str,
    pub level: ZoneLevel,
    pub center: LatLng,
    /// Percent, 0-100.
    pub pollution: f64,
    pub trend: Trend,
}
