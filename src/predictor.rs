//! Forecasts as bounded random drift.
//!
//! There is no model here: a forecast is the current value plus uniform
//! noise whose width grows linearly with the horizon.

use std::collections::BTreeMap;

use rand::Rng;

use crate::models::{NodePrediction, ParameterPredictions, Prediction, Reading};
use crate::simulator::{self, NODES};

// ---

/// Drift half-width per hour of horizon.
const DRIFT_PER_HOUR: f64 = 0.1;

/// `current` plus uniform noise in `±0.1 * horizon_hours`.
pub fn predict<R: Rng + ?Sized>(current: f64, horizon_hours: f64, rng: &mut R) -> f64 {
    // ---
    let spread = DRIFT_PER_HOUR * horizon_hours.abs();
    if spread == 0.0 {
        return current;
    }
    current + rng.gen_range(-spread..=spread)
}

fn prediction<R: Rng + ?Sized>(current: f64, rng: &mut R) -> Prediction {
    // ---
    Prediction {
        current,
        pred_1h: predict(current, 1.0, rng),
        pred_6h: predict(current, 6.0, rng),
    }
}

/// Forecast every parameter of every catalog node.
///
/// A node without a current reading is forecast from a fresh baseline reading.
pub fn node_predictions<R: Rng + ?Sized>(
    current: &BTreeMap<String, Reading>,
    rng: &mut R,
) -> Vec<NodePrediction> {
    // ---
    NODES
        .iter()
        .map(|&node_id| {
            let reading = match current.get(node_id) {
                Some(r) => r.clone(),
                None => simulator::generate_reading(node_id, None, &mut *rng),
            };

            NodePrediction {
                node_id: node_id.to_string(),
                predictions: ParameterPredictions {
                    ph: prediction(reading.ph, &mut *rng),
                    turbidity: prediction(reading.turbidity, &mut *rng),
                    flow: prediction(reading.flow, &mut *rng),
                    temperature: prediction(reading.temperature, &mut *rng),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::Parameter;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn std_dev(samples: &[f64]) -> f64 {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        (samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt()
    }

    #[test]
    fn test_zero_horizon_is_current_value() {
        // ---
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(predict(7.25, 0.0, &mut rng), 7.25);
        }
    }

    #[test]
    fn test_prediction_stays_within_horizon_band() {
        // ---
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..10_000 {
            assert!((predict(50.0, 1.0, &mut rng) - 50.0).abs() <= 0.1 + 1e-12);
            assert!((predict(50.0, 6.0, &mut rng) - 50.0).abs() <= 0.6 + 1e-12);
        }
    }

    #[test]
    fn test_spread_scales_linearly_with_horizon() {
        // ---
        let mut rng = StdRng::seed_from_u64(3);
        let one: Vec<f64> = (0..20_000).map(|_| predict(0.0, 1.0, &mut rng)).collect();
        let six: Vec<f64> = (0..20_000).map(|_| predict(0.0, 6.0, &mut rng)).collect();

        let ratio = std_dev(&six) / std_dev(&one);
        assert!((5.5..6.5).contains(&ratio), "std dev ratio was {ratio}");

        // uniform on [-0.1, 0.1] has variance 0.01 / 3
        let var_one = std_dev(&one).powi(2);
        assert!((var_one - 0.01 / 3.0).abs() < 0.0005, "variance was {var_one}");
    }

    #[test]
    fn test_node_predictions_cover_every_node() {
        // ---
        let mut rng = StdRng::seed_from_u64(4);
        let mut current = BTreeMap::new();
        let reading = simulator::generate_reading("Node_B", None, &mut rng);
        current.insert("Node_B".to_string(), reading.clone());

        let predictions = node_predictions(&current, &mut rng);
        let ids: Vec<_> = predictions.iter().map(|p| p.node_id.as_str()).collect();
        assert_eq!(ids, NODES.to_vec());

        let node_b = &predictions[1].predictions;
        assert_eq!(node_b.get(Parameter::Ph).current, reading.ph);
        assert_eq!(node_b.get(Parameter::Flow).current, reading.flow);
        for parameter in Parameter::ALL {
            let p = node_b.get(parameter);
            assert!((p.pred_1h - p.current).abs() <= 0.1 + 1e-12);
            assert!((p.pred_6h - p.current).abs() <= 0.6 + 1e-12);
        }
    }
}
