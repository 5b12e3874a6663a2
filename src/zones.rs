//! Static pollution-zone catalog for the map view, plus the synthetic
//! history and trend-driven forecast shown when a zone is opened.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::models::{LatLng, Prediction, Trend, Zone, ZoneLevel};

// ---

const fn zone(
    id: &'static str,
    name: &'static str,
    level: ZoneLevel,
    lat: f64,
    lng: f64,
    pollution: f64,
    trend: Trend,
) -> Zone {
    Zone {
        id,
        name,
        level,
        center: LatLng { lat, lng },
        pollution,
        trend,
    }
}

pub static POLLUTION_ZONES: [Zone; 10] = [
    zone("zone_1", "Industrial District North", ZoneLevel::Critical, 33.8950, 10.1100, 85.0, Trend::Increasing),
    zone("zone_2", "Coastal Area East", ZoneLevel::Warning, 33.8750, 10.1250, 55.0, Trend::Stable),
    zone("zone_3", "Residential Zone West", ZoneLevel::Moderate, 33.8900, 10.0800, 35.0, Trend::Decreasing),
    zone("zone_4", "Factory Complex South", ZoneLevel::Critical, 33.8680, 10.0950, 92.0, Trend::Increasing),
    zone("zone_5", "Agricultural Area", ZoneLevel::Moderate, 33.9050, 10.0950, 28.0, Trend::Stable),
    zone("zone_6", "Port District", ZoneLevel::Warning, 33.8820, 10.1350, 68.0, Trend::Increasing),
    zone("zone_7", "Downtown Area", ZoneLevel::Warning, 33.8815, 10.0982, 47.0, Trend::Stable),
    zone("zone_8", "Chemical Plant Zone", ZoneLevel::Critical, 33.8580, 10.1050, 78.0, Trend::Increasing),
    zone("zone_9", "University District", ZoneLevel::Moderate, 33.9000, 10.1050, 22.0, Trend::Decreasing),
    zone("zone_10", "Market Area", ZoneLevel::Warning, 33.8700, 10.0850, 51.0, Trend::Stable),
];

pub const DEFAULT_POLYGON_SIZE: f64 = 0.025;
const POLYGON_POINTS: usize = 8;
const HISTORY_SAMPLES: i64 = 21;
const HISTORY_SPACING_MINUTES: i64 = 10;

pub fn find_zone(id: &str) -> Option<&'static Zone> {
    POLLUTION_ZONES.iter().find(|z| z.id == id)
}

/// Octagon around `center`, starting due north and going clockwise.
pub fn polygon_path(center: LatLng, size: f64) -> Vec<LatLng> {
    // ---
    (0..POLYGON_POINTS)
        .map(|i| {
            let angle = (i as f64) * 2.0 * PI / (POLYGON_POINTS as f64);
            LatLng {
                lat: center.lat + size * angle.cos(),
                lng: center.lng + size * angle.sin(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PollutionSample {
    pub timestamp: DateTime<Utc>,
    pub pollution: f64,
}

/// Fabricated history: samples every 10 minutes ending at `now`, each within ±5 of `base`.
pub fn pollution_history<R: Rng + ?Sized>(
    base: f64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<PollutionSample> {
    // ---
    (0..HISTORY_SAMPLES)
        .rev()
        .map(|i| PollutionSample {
            timestamp: now - Duration::minutes(i * HISTORY_SPACING_MINUTES),
            pollution: (base + rng.gen_range(-5.0..5.0)).clamp(0.0, 100.0),
        })
        .collect()
}

/// Trend-driven forecast for a zone's pollution level.
pub fn zone_forecast<R: Rng + ?Sized>(current: f64, trend: Trend, rng: &mut R) -> Prediction {
    // ---
    let (pred_1h, pred_6h) = match trend {
        Trend::Increasing => (
            (current + rng.gen_range(2.0..10.0)).min(100.0),
            (current + rng.gen_range(10.0..30.0)).min(100.0),
        ),
        Trend::Decreasing => (
            (current - rng.gen_range(2.0..7.0)).max(0.0),
            (current - rng.gen_range(5.0..20.0)).max(0.0),
        ),
        Trend::Stable => (
            current + rng.gen_range(-2.0..2.0),
            current + rng.gen_range(-4.0..4.0),
        ),
    };

    Prediction {
        current,
        pred_1h,
        pred_6h,
    }
}
