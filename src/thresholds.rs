//! Threshold evaluation: turns a reading into zero or more alerts.
//!
//! The evaluator is stateless. Every breach is reported on every call, so
//! a node that stays out of range keeps producing fresh alerts; any
//! deduplication belongs to the caller.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{
    Alert, MaxLimit, MinLimit, Parameter, RangeLimit, Reading, Severity, ThresholdConfig,
};

// ---

pub const DEFAULT_THRESHOLDS: ThresholdConfig = ThresholdConfig {
    ph: RangeLimit { min: 5.5, max: 9.0 },
    turbidity: MaxLimit { max: 100.0 },
    flow: MinLimit { min: 50.0 },
    temperature: MaxLimit { max: 35.0 },
};

/// Compare `reading` against `thresholds`, one alert per breached rule.
pub fn evaluate(reading: &Reading, thresholds: &ThresholdConfig) -> Vec<Alert> {
    // ---
    let mut alerts = Vec::new();
    let mut emit = |parameter, severity, message: String| {
        alerts.push(Alert {
            id: Uuid::new_v4(),
            node_id: reading.node_id.clone(),
            parameter,
            severity,
            message,
            timestamp: reading.timestamp,
        });
    };

    if reading.ph < thresholds.ph.min {
        emit(
            Parameter::Ph,
            Severity::Critical,
            format!("pH too low: {:.2} (min: {})", reading.ph, thresholds.ph.min),
        );
    }
    if reading.ph > thresholds.ph.max {
        emit(
            Parameter::Ph,
            Severity::Critical,
            format!("pH too high: {:.2} (max: {})", reading.ph, thresholds.ph.max),
        );
    }
    if reading.turbidity > thresholds.turbidity.max {
        emit(
            Parameter::Turbidity,
            Severity::Warning,
            format!(
                "High turbidity: {:.0} NTU (max: {})",
                reading.turbidity, thresholds.turbidity.max
            ),
        );
    }
    if reading.flow < thresholds.flow.min {
        emit(
            Parameter::Flow,
            Severity::Warning,
            format!("Low flow rate: {:.0} L/min (min: {})", reading.flow, thresholds.flow.min),
        );
    }
    if reading.temperature > thresholds.temperature.max {
        emit(
            Parameter::Temperature,
            Severity::Warning,
            format!(
                "High temperature: {:.1}°C (max: {})",
                reading.temperature, thresholds.temperature.max
            ),
        );
    }

    alerts
}

// ---

/// Threshold form submission.
///
/// Each group (`pH`, `turbidity`, ...) is kept as raw JSON so that a
/// malformed group never rejects the whole form. Absent (or `null`) groups
/// and bounds keep their current value. A present bound that is not
/// numeric becomes 0, and so does every bound of a group that is not an
/// object.
#[derive(Debug, Default, Deserialize)]
pub struct ThresholdInput {
    #[serde(rename = "pH", default)]
    pub ph: Option<Value>,
    #[serde(default)]
    pub turbidity: Option<Value>,
    #[serde(default)]
    pub flow: Option<Value>,
    #[serde(default)]
    pub temperature: Option<Value>,
}

impl ThresholdInput {
    /// Overlay this input on `current`, producing a complete config.
    pub fn apply(&self, current: &ThresholdConfig) -> ThresholdConfig {
        // ---
        ThresholdConfig {
            ph: RangeLimit {
                min: bound(&self.ph, "min", current.ph.min),
                max: bound(&self.ph, "max", current.ph.max),
            },
            turbidity: MaxLimit {
                max: bound(&self.turbidity, "max", current.turbidity.max),
            },
            flow: MinLimit {
                min: bound(&self.flow, "min", current.flow.min),
            },
            temperature: MaxLimit {
                max: bound(&self.temperature, "max", current.temperature.max),
            },
        }
    }
}

fn bound(group: &Option<Value>, key: &str, keep: f64) -> f64 {
    // ---
    match group {
        None | Some(Value::Null) => keep,
        Some(Value::Object(fields)) => match fields.get(key) {
            None | Some(Value::Null) => keep,
            Some(value) => coerce_number(value),
        },
        Some(_) => 0.0,
    }
}

/// Lenient numeric coercion. Strings use their leading numeric prefix
/// (`"6.5abc"` is 6.5); anything without one, or not finite, becomes 0.
pub fn coerce_number(value: &Value) -> f64 {
    // ---
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_float(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Longest prefix of `s` (after leading whitespace) that reads as a decimal number.
fn leading_float(s: &str) -> Option<f64> {
    // ---
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    s[..end].parse().ok()
}
