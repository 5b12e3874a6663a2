//! Danger score: a 0-100 severity indicator summed from fixed per-parameter weights.

use serde::Serialize;

use crate::models::{Reading, ThresholdConfig};

// ---

const PH_SOFT_BAND: (f64, f64) = (6.0, 8.5);
const TURBIDITY_SOFT_MAX: f64 = 100.0;
const FLOW_SOFT_MIN: f64 = 70.0;
const TEMPERATURE_SOFT_MAX: f64 = 32.0;

/// Score `reading` against `thresholds`.
///
/// A hard breach of a configured threshold weighs more than straying out
/// of the fixed soft band; contributions are summed and capped at 100.
pub fn danger_score(reading: &Reading, thresholds: &ThresholdConfig) -> u8 {
    // ---
    let ph = if reading.ph < thresholds.ph.min || reading.ph > thresholds.ph.max {
        30
    } else if reading.ph < PH_SOFT_BAND.0 || reading.ph > PH_SOFT_BAND.1 {
        15
    } else {
        0
    };

    let turbidity = if reading.turbidity > thresholds.turbidity.max {
        25
    } else if reading.turbidity > TURBIDITY_SOFT_MAX {
        10
    } else {
        0
    };

    let flow = if reading.flow < thresholds.flow.min {
        25
    } else if reading.flow < FLOW_SOFT_MIN {
        10
    } else {
        0
    };

    let temperature = if reading.temperature > thresholds.temperature.max {
        20
    } else if reading.temperature > TEMPERATURE_SOFT_MAX {
        10
    } else {
        0
    };

    let total: u32 = ph + turbidity + flow + temperature;
    total.min(100) as u8
}

/// Display band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerLevel {
    Safe,
    Warning,
    Danger,
}

impl DangerLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => DangerLevel::Safe,
            30..=59 => DangerLevel::Warning,
            _ => DangerLevel::Danger,
        }
    }

    /// Band for a citizen report's self-declared danger percentage.
    pub fn from_report_level(level: f64) -> Self {
        if level >= 70.0 {
            DangerLevel::Danger
        } else if level >= 40.0 {
            DangerLevel::Warning
        } else {
            DangerLevel::Safe
        }
    }

    /// Map marker colour used by the dashboard.
    pub fn color(&self) -> &'static str {
        match self {
            DangerLevel::Safe => "#3DD598",
            DangerLevel::Warning => "#FFC542",
            DangerLevel::Danger => "#FC5A5A",
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::thresholds::DEFAULT_THRESHOLDS;
    use chrono::Utc;

    fn reading(ph: f64, turbidity: f64, flow: f64, temperature: f64) -> Reading {
        // ---
        Reading {
            node_id: "Node_D".to_string(),
            ph,
            turbidity,
            flow,
            temperature,
            timestamp: Utc::now(),
        }
    }

    fn score(ph: f64, turbidity: f64, flow: f64, temperature: f64) -> u8 {
        danger_score(&reading(ph, turbidity, flow, temperature), &DEFAULT_THRESHOLDS)
    }

    #[test]
    fn test_safe_midpoints_score_zero() {
        assert_eq!(score(7.0, 50.0, 120.0, 25.0), 0);
    }

    #[test]
    fn test_report_level_bands() {
        // ---
        assert_eq!(DangerLevel::from_report_level(0.0), DangerLevel::Safe);
        assert_eq!(DangerLevel::from_report_level(39.9), DangerLevel::Safe);
        assert_eq!(DangerLevel::from_report_level(40.0), DangerLevel::Warning);
        assert_eq!(DangerLevel::from_report_level(69.0), DangerLevel::Warning);
        assert_eq!(DangerLevel::from_report_level(70.0), DangerLevel::Danger);
    }

    #[test]
    fn test_everything_breached_caps_at_100() {
        assert_eq!(score(3.0, 180.0, 10.0, 39.0), 100);
    }

    #[test]
    fn test_soft_band_contributions() {
        // ---
        assert_eq!(score(5.8, 50.0, 120.0, 25.0), 15);
        assert_eq!(score(8.7, 50.0, 120.0, 25.0), 15);
        // turbidity soft max equals the default hard max, so only the hard rule fires
        assert_eq!(score(7.0, 101.0, 120.0, 25.0), 25);
        assert_eq!(score(7.0, 50.0, 60.0, 25.0), 10);
        assert_eq!(score(7.0, 50.0, 120.0, 33.0), 10);
    }

    #[test]
    fn test_turbidity_soft_rule_with_relaxed_threshold() {
        // ---
        let relaxed = ThresholdConfig {
            turbidity: crate::models::MaxLimit { max: 150.0 },
            ..DEFAULT_THRESHOLDS
        };
        let r = reading(7.0, 120.0, 120.0, 25.0);
        assert_eq!(danger_score(&r, &relaxed), 10);
    }

    #[test]
    fn test_hard_breach_contributions() {
        // ---
        assert_eq!(score(5.0, 50.0, 120.0, 25.0), 30);
        assert_eq!(score(7.0, 50.0, 40.0, 25.0), 25);
        assert_eq!(score(7.0, 50.0, 120.0, 36.0), 20);
        assert_eq!(score(5.0, 50.0, 40.0, 36.0), 75);
    }

    #[test]
    fn test_score_is_monotonic_per_parameter() {
        // ---
        let steps = 200;
        let sweep = |from: f64, to: f64, f: &dyn Fn(f64) -> u8| {
            let mut last = 0;
            for i in 0..=steps {
                let v = from + (to - from) * (i as f64) / (steps as f64);
                let s = f(v);
                assert!(s >= last, "score dropped from {last} to {s} at {v}");
                last = s;
            }
        };

        sweep(7.0, 3.0, &|v| score(v, 50.0, 120.0, 25.0));
        sweep(7.0, 11.0, &|v| score(v, 50.0, 120.0, 25.0));
        sweep(50.0, 200.0, &|v| score(7.0, v, 120.0, 25.0));
        sweep(120.0, 0.0, &|v| score(7.0, 50.0, v, 25.0));
        sweep(25.0, 40.0, &|v| score(7.0, 50.0, 120.0, v));
    }

    #[test]
    fn test_danger_levels() {
        // ---
        assert_eq!(DangerLevel::from_score(0), DangerLevel::Safe);
        assert_eq!(DangerLevel::from_score(29), DangerLevel::Safe);
        assert_eq!(DangerLevel::from_score(30), DangerLevel::Warning);
        assert_eq!(DangerLevel::from_score(59), DangerLevel::Warning);
        assert_eq!(DangerLevel::from_score(60), DangerLevel::Danger);
        assert_eq!(DangerLevel::from_score(100).color(), "#FC5A5A");
    }
}
