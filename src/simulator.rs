//! Synthetic sensor readings for the fixed node catalog.
//!
//! Each tick drifts every field a little away from the previous reading
//! (or from a baseline for a fresh node) and clamps it back into the
//! field's physical range.

use chrono::Utc;
use rand::Rng;

use crate::models::{LatLng, Reading};

// ---

/// The four logical sensor locations.
pub const NODES: [&str; 4] = ["Node_A", "Node_B", "Node_C", "Node_D"];

/// Bounds, baseline and per-tick drift width for one measured field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub min: f64,
    pub max: f64,
    pub baseline: f64,
    /// Total width of the uniform drift window, centred on zero.
    pub drift: f64,
}

impl FieldSpec {
    fn next<R: Rng + ?Sized>(&self, previous: Option<f64>, rng: &mut R) -> f64 {
        // ---
        let base = previous.unwrap_or(self.baseline);
        let half = self.drift / 2.0;
        (base + rng.gen_range(-half..half)).clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub const PH: FieldSpec = FieldSpec { min: 4.0, max: 10.0, baseline: 7.0, drift: 0.5 };
pub const TURBIDITY: FieldSpec = FieldSpec { min: 0.0, max: 200.0, baseline: 75.0, drift: 15.0 };
pub const FLOW: FieldSpec = FieldSpec { min: 0.0, max: 200.0, baseline: 100.0, drift: 10.0 };
pub const TEMPERATURE: FieldSpec = FieldSpec { min: 15.0, max: 40.0, baseline: 25.0, drift: 2.0 };

/// Produce the next reading for `node_id`, drifting from `previous` when given.
pub fn generate_reading<R: Rng + ?Sized>(
    node_id: &str,
    previous: Option<&Reading>,
    rng: &mut R,
) -> Reading {
    // ---
    Reading {
        node_id: node_id.to_string(),
        ph: PH.next(previous.map(|p| p.ph), rng),
        turbidity: TURBIDITY.next(previous.map(|p| p.turbidity), rng),
        flow: FLOW.next(previous.map(|p| p.flow), rng),
        temperature: TEMPERATURE.next(previous.map(|p| p.temperature), rng),
        timestamp: Utc::now(),
    }
}

/// Map position of a node, offset from the plant's reference point.
pub fn node_coordinates(node_id: &str) -> LatLng {
    // ---
    const BASE: LatLng = LatLng { lat: 33.8815, lng: 10.0982 };

    let (dlat, dlng) = match node_id {
        "Node_A" => (0.02, 0.01),
        "Node_B" => (-0.01, 0.03),
        "Node_C" => (0.01, -0.02),
        "Node_D" => (-0.02, -0.01),
        _ => (0.0, 0.0),
    };

    LatLng {
        lat: BASE.lat + dlat,
        lng: BASE.lng + dlng,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_in_bounds(r: &Reading) {
        assert!(PH.contains(r.ph), "pH out of bounds: {}", r.ph);
        assert!(TURBIDITY.contains(r.turbidity), "turbidity out of bounds: {}", r.turbidity);
        assert!(FLOW.contains(r.flow), "flow out of bounds: {}", r.flow);
        assert!(
            TEMPERATURE.contains(r.temperature),
            "temperature out of bounds: {}",
            r.temperature
        );
    }

    #[test]
    fn test_fresh_reading_starts_near_baseline() {
        // ---
        let mut rng = StdRng::seed_from_u64(7);
        let r = generate_reading("Node_A", None, &mut rng);

        assert_eq!(r.node_id, "Node_A");
        assert!((r.ph - 7.0).abs() <= 0.25);
        assert!((r.turbidity - 75.0).abs() <= 7.5);
        assert!((r.flow - 100.0).abs() <= 5.0);
        assert!((r.temperature - 25.0).abs() <= 1.0);
    }

    #[test]
    fn test_fields_stay_clamped_over_many_ticks() {
        // ---
        let mut rng = StdRng::seed_from_u64(42);
        for node in NODES {
            let mut reading = generate_reading(node, None, &mut rng);
            for _ in 0..5_000 {
                reading = generate_reading(node, Some(&reading), &mut rng);
                assert_in_bounds(&reading);
            }
        }
    }

    #[test]
    fn test_edge_previous_values_are_pulled_back_in_range() {
        // ---
        let mut rng = StdRng::seed_from_u64(3);
        let extreme = Reading {
            node_id: "Node_B".to_string(),
            ph: 10.0,
            turbidity: 0.0,
            flow: 200.0,
            temperature: 15.0,
            timestamp: Utc::now(),
        };

        for _ in 0..200 {
            let next = generate_reading("Node_B", Some(&extreme), &mut rng);
            assert_in_bounds(&next);
        }
    }

    #[test]
    fn test_drift_is_bounded_per_tick() {
        // ---
        let mut rng = StdRng::seed_from_u64(11);
        let prev = generate_reading("Node_C", None, &mut rng);
        let next = generate_reading("Node_C", Some(&prev), &mut rng);

        assert!((next.ph - prev.ph).abs() <= 0.25);
        assert!((next.turbidity - prev.turbidity).abs() <= 7.5);
        assert!((next.flow - prev.flow).abs() <= 5.0);
        assert!((next.temperature - prev.temperature).abs() <= 1.0);
    }

    #[test]
    fn test_node_coordinates() {
        // ---
        let a = node_coordinates("Node_A");
        assert!((a.lat - 33.9015).abs() < 1e-9);
        assert!((a.lng - 10.1082).abs() < 1e-9);

        let unknown = node_coordinates("Node_Z");
        assert_eq!(unknown, LatLng { lat: 33.8815, lng: 10.0982 });
    }
}
