//! Session-owned monitoring state.
//!
//! One [`Session`] exists per authenticated user. It is the single writer of
//! every piece of live state (current readings, bounded histories, the alert
//! ring, predictions, insights) and each refresh replaces its slice of state
//! wholesale. It performs no I/O; persistence is the monitor's job.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::danger::danger_score;
use crate::insights::select_insights;
use crate::models::{Alert, NodePrediction, ParameterAverages, Reading, ThresholdConfig};
use crate::predictor::node_predictions;
use crate::simulator::{generate_reading, NODES};
use crate::thresholds::{evaluate, DEFAULT_THRESHOLDS};

// ---

pub const DEFAULT_HISTORY_CAP: usize = 50;
pub const DEFAULT_ALERT_CAP: usize = 20;

/// Outcome of one reading tick.
#[derive(Debug, Clone)]
pub struct Tick {
    pub readings: Vec<Reading>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug)]
pub struct Session {
    // ---
    user_id: String,
    thresholds: ThresholdConfig,
    current: BTreeMap<String, Reading>,
    history: BTreeMap<String, VecDeque<Reading>>,
    /// Newest first.
    alerts: VecDeque<Alert>,
    predictions: Vec<NodePrediction>,
    insights: Vec<&'static str>,
    history_cap: usize,
    alert_cap: usize,
    rng: StdRng,
}

impl Session {
    pub fn new(user_id: &str, history_cap: usize, alert_cap: usize) -> Self {
        Self::with_rng(user_id, history_cap, alert_cap, StdRng::from_entropy())
    }

    /// Session with a caller-supplied RNG (seeded in tests).
    pub fn with_rng(user_id: &str, history_cap: usize, alert_cap: usize, rng: StdRng) -> Self {
        // ---
        Self {
            user_id: user_id.to_string(),
            thresholds: DEFAULT_THRESHOLDS,
            current: BTreeMap::new(),
            history: BTreeMap::new(),
            alerts: VecDeque::new(),
            predictions: Vec::new(),
            insights: Vec::new(),
            history_cap,
            alert_cap,
            rng,
        }
    }

    /// Seed one baseline reading per node plus initial insights and predictions.
    pub fn start(&mut self) -> Vec<Reading> {
        // ---
        let readings: Vec<Reading> = NODES
            .iter()
            .map(|&node_id| generate_reading(node_id, None, &mut self.rng))
            .collect();

        self.current = readings
            .iter()
            .map(|r| (r.node_id.clone(), r.clone()))
            .collect();
        self.history = readings
            .iter()
            .map(|r| (r.node_id.clone(), VecDeque::from([r.clone()])))
            .collect();
        self.insights = select_insights(&mut self.rng);
        self.refresh_predictions();

        readings
    }

    /// Advance every node by one simulator step and evaluate thresholds.
    pub fn tick(&mut self) -> Tick {
        // ---
        let readings: Vec<Reading> = NODES
            .iter()
            .map(|&node_id| generate_reading(node_id, self.current.get(node_id), &mut self.rng))
            .collect();

        for reading in &readings {
            let history = self.history.entry(reading.node_id.clone()).or_default();
            history.push_back(reading.clone());
            while history.len() > self.history_cap {
                history.pop_front();
            }
        }
        self.current = readings
            .iter()
            .map(|r| (r.node_id.clone(), r.clone()))
            .collect();

        let alerts: Vec<Alert> = readings
            .iter()
            .flat_map(|r| evaluate(r, &self.thresholds))
            .collect();
        self.record_alerts(&alerts);

        Tick { readings, alerts }
    }

    // keep node order within the batch, batch ahead of older alerts
    fn record_alerts(&mut self, alerts: &[Alert]) {
        for alert in alerts.iter().rev() {
            self.alerts.push_front(alert.clone());
        }
        self.alerts.truncate(self.alert_cap);
    }

    pub fn refresh_predictions(&mut self) -> &[NodePrediction] {
        self.predictions = node_predictions(&self.current, &mut self.rng);
        &self.predictions
    }

    pub fn refresh_insights(&mut self) -> &[&'static str] {
        self.insights = select_insights(&mut self.rng);
        &self.insights
    }

    /// Replace the active thresholds and evaluate the current readings
    /// against them at once. Returns the alerts that raised.
    pub fn set_thresholds(&mut self, thresholds: ThresholdConfig) -> Vec<Alert> {
        // ---
        self.thresholds = thresholds;
        let alerts: Vec<Alert> = self
            .current
            .values()
            .flat_map(|r| evaluate(r, &self.thresholds))
            .collect();
        self.record_alerts(&alerts);
        alerts
    }

    /// Per-parameter mean over the node catalog; a node without a reading counts as 0.
    pub fn averages(&self) -> ParameterAverages {
        // ---
        let mean = |value: fn(&Reading) -> f64| {
            let total: f64 = NODES
                .iter()
                .map(|&node_id| self.current.get(node_id).map_or(0.0, value))
                .sum();
            (total / NODES.len() as f64 * 100.0).round() / 100.0
        };

        ParameterAverages {
            ph: mean(|r: &Reading| r.ph),
            turbidity: mean(|r: &Reading| r.turbidity),
            flow: mean(|r: &Reading| r.flow),
            temperature: mean(|r: &Reading| r.temperature),
        }
    }

    pub fn clear_alerts(&mut self) {
        self.alerts.clear();
    }

    /// Drop live state for one node. The next tick restarts it from baseline.
    pub fn forget_node(&mut self, node_id: &str) {
        self.current.remove(node_id);
        self.history.remove(node_id);
    }

    /// Drop all live readings, histories and alerts.
    pub fn reset(&mut self) {
        self.current.clear();
        self.history.clear();
        self.alerts.clear();
    }

    /// Danger score per node with a current reading.
    pub fn danger_scores(&self) -> BTreeMap<String, u8> {
        // ---
        self.current
            .iter()
            .map(|(node_id, r)| (node_id.clone(), danger_score(r, &self.thresholds)))
            .collect()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn current(&self) -> &BTreeMap<String, Reading> {
        &self.current
    }

    pub fn history(&self, node_id: &str) -> Vec<Reading> {
        self.history
            .get(node_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }

    pub fn predictions(&self) -> &[NodePrediction] {
        &self.predictions
    }

    pub fn insights(&self) -> &[&'static str] {
        &self.insights
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{MaxLimit, MinLimit, RangeLimit, Severity};

    fn session() -> Session {
        Session::with_rng("ops@plant.example", 5, 6, StdRng::seed_from_u64(21))
    }

    /// Bounds no simulated reading can satisfy, so every node alerts every tick.
    fn impossible() -> ThresholdConfig {
        ThresholdConfig {
            ph: RangeLimit { min: 11.0, max: 12.0 },
            turbidity: MaxLimit { max: 1_000.0 },
            flow: MinLimit { min: -1.0 },
            temperature: MaxLimit { max: 100.0 },
        }
    }

    #[test]
    fn test_start_seeds_every_node() {
        // ---
        let mut s = session();
        let readings = s.start();

        assert_eq!(readings.len(), 4);
        assert_eq!(s.current().len(), 4);
        assert_eq!(s.history("Node_A").len(), 1);
        assert_eq!(s.insights().len(), 3);
        assert_eq!(s.predictions().len(), 4);
        assert!(s.alerts().is_empty());
    }

    #[test]
    fn test_history_is_capped() {
        // ---
        let mut s = session();
        s.start();
        for _ in 0..20 {
            s.tick();
        }

        let history = s.history("Node_B");
        assert_eq!(history.len(), 5);
        assert_eq!(history.last(), s.current().get("Node_B"));
    }

    #[test]
    fn test_tick_drifts_from_previous_reading() {
        // ---
        let mut s = session();
        s.start();
        let before = s.current().get("Node_C").cloned().unwrap();
        s.tick();
        let after = s.current().get("Node_C").cloned().unwrap();

        assert!((after.ph - before.ph).abs() <= 0.25);
        assert!((after.turbidity - before.turbidity).abs() <= 7.5);
    }

    #[test]
    fn test_alert_ring_keeps_newest_first() {
        // ---
        let mut s = session();
        s.start();
        s.set_thresholds(impossible());
        s.clear_alerts();

        let first = s.tick();
        assert_eq!(first.alerts.len(), 4);
        assert!(first.alerts.iter().all(|a| a.severity == Severity::Critical));

        let second = s.tick();
        let ring = s.alerts();
        assert_eq!(ring.len(), 6);
        // whole second batch, then the newest of the first batch
        let ids: Vec<_> = ring.iter().map(|a| a.id).collect();
        let expected: Vec<_> = second
            .alerts
            .iter()
            .chain(first.alerts.iter().take(2))
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_repeated_breach_is_re_emitted() {
        // ---
        let mut s = session();
        s.start();
        s.set_thresholds(impossible());

        let a = s.tick();
        let b = s.tick();
        assert_eq!(a.alerts.len(), b.alerts.len());
        assert_ne!(a.alerts[0].id, b.alerts[0].id);
    }

    #[test]
    fn test_stricter_thresholds_alert_immediately() {
        // ---
        let mut s = session();
        s.start();
        assert!(s.alerts().is_empty());

        let raised = s.set_thresholds(impossible());
        assert_eq!(raised.len(), 4);
        assert_eq!(s.alerts().len(), 4);
        assert!(raised.iter().all(|a| a.message.starts_with("pH too low")));

        // loosening again raises nothing new
        assert!(s.set_thresholds(DEFAULT_THRESHOLDS).is_empty());
        assert_eq!(s.alerts().len(), 4);
    }

    #[test]
    fn test_averages_count_missing_nodes_as_zero() {
        // ---
        let mut s = session();
        s.start();
        let expected_ph: f64 = s.current().values().map(|r| r.ph).sum::<f64>() / 4.0;
        let averages = s.averages();
        assert!((averages.ph - expected_ph).abs() <= 0.005);
        assert_eq!(averages.ph, (averages.ph * 100.0).round() / 100.0);

        s.forget_node("Node_A");
        let without_a = s.averages();
        assert!(without_a.temperature < averages.temperature);

        s.reset();
        assert_eq!(s.averages().flow, 0.0);
    }

    #[test]
    fn test_forget_node_and_reset() {
        // ---
        let mut s = session();
        s.start();
        s.set_thresholds(impossible());
        s.tick();

        s.forget_node("Node_A");
        assert!(s.current().get("Node_A").is_none());
        assert!(s.history("Node_A").is_empty());
        assert_eq!(s.danger_scores().len(), 3);

        s.reset();
        assert!(s.current().is_empty());
        assert!(s.alerts().is_empty());

        // next tick restarts every node
        s.tick();
        assert_eq!(s.current().len(), 4);
    }

    #[test]
    fn test_danger_scores_follow_thresholds() {
        // ---
        let mut s = session();
        s.start();
        assert!(s.danger_scores().values().all(|&score| score <= 100));

        s.set_thresholds(impossible());
        assert!(s.danger_scores().values().all(|&score| score >= 30));
    }
}
