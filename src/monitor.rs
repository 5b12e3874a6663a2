//! Session controller: drives the periodic refresh tasks and talks to the
//! persistence gateway on the session's behalf.
//!
//! Three timers run independently (readings, predictions, insights) and
//! never assume anything about each other's ordering. Reading writes are
//! fire-and-forget: a failed write is logged and dropped, the in-memory
//! state is already updated and the loop keeps going.
//!
//! Deletes are fenced against those background writes. A write stamped
//! before a delete completed is dropped instead of resurrecting the data.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::RefreshIntervals;
use crate::gateway::{GatewayError, PersistenceGateway, StorePaths, REQUESTS_PATH};
use crate::models::{Reading, Severity, ThresholdConfig};
use crate::requests::{self, PollutionRequest};
use crate::session::{Session, Tick};
use crate::thresholds::DEFAULT_THRESHOLDS;

// ---

/// Cheaply cloneable handle shared by the refresh tasks and HTTP handlers.
#[derive(Clone)]
pub struct Monitor {
    session: Arc<RwLock<Session>>,
    gateway: Arc<dyn PersistenceGateway>,
    paths: StorePaths,
    fence: Arc<RwLock<WriteFence>>,
    threshold_writes: Arc<Mutex<()>>,
}

/// Delete generations. Reading writes hold the read side while they run;
/// deletes take the write side and bump the generation they cleared.
#[derive(Debug, Default)]
struct WriteFence {
    all: u64,
    nodes: HashMap<String, u64>,
}

type Stamp = (u64, u64);

impl WriteFence {
    fn stamp(&self, node_id: &str) -> Stamp {
        (self.all, self.nodes.get(node_id).copied().unwrap_or(0))
    }
}

impl Monitor {
    pub fn new(session: Session, gateway: Arc<dyn PersistenceGateway>) -> Self {
        // ---
        let paths = StorePaths::new(session.user_id());
        Self {
            session: Arc::new(RwLock::new(session)),
            gateway,
            paths,
            fence: Arc::new(RwLock::new(WriteFence::default())),
            threshold_writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.gateway.backend()
    }

    /// Run `f` against a read-locked session and return its result.
    pub async fn view<T>(&self, f: impl FnOnce(&Session) -> T) -> T {
        f(&*self.session.read().await)
    }

    /// Restore saved thresholds and seed the first readings.
    pub async fn start(&self) {
        // ---
        let thresholds = self.restore_thresholds().await;
        let mut session = self.session.write().await;
        session.set_thresholds(thresholds);
        let seeded = session.start();
        tracing::info!(
            user = session.user_id(),
            nodes = seeded.len(),
            "Monitoring session started"
        );
    }

    /// Saved thresholds, or the defaults when none are stored or they cannot be read.
    async fn restore_thresholds(&self) -> ThresholdConfig {
        // ---
        match self.gateway.read(&self.paths.thresholds()).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(cfg) => {
                    tracing::info!("Restored saved thresholds");
                    cfg
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Saved thresholds are malformed, using defaults");
                    DEFAULT_THRESHOLDS
                }
            },
            Ok(None) => DEFAULT_THRESHOLDS,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load saved thresholds, using defaults");
                DEFAULT_THRESHOLDS
            }
        }
    }

    /// One reading cycle: advance the simulator, evaluate alerts, persist in the background.
    pub async fn refresh_readings(&self) -> Tick {
        // ---
        // stamp under the fence so a delete cannot slip between tick and stamp
        let fence = self.fence.read().await;
        let tick = self.session.write().await.tick();
        let stamps: Vec<Stamp> = tick.readings.iter().map(|r| fence.stamp(&r.node_id)).collect();
        drop(fence);

        for (reading, stamp) in tick.readings.iter().zip(stamps) {
            let monitor = self.clone();
            let reading = reading.clone();
            tokio::spawn(async move { monitor.persist_stamped(&reading, stamp).await });
        }

        if !tick.alerts.is_empty() {
            let critical = tick
                .alerts
                .iter()
                .filter(|a| a.severity == Severity::Critical)
                .count();
            tracing::warn!(
                alerts = tick.alerts.len(),
                critical,
                "Threshold breaches detected"
            );
        }
        tracing::debug!(readings = tick.readings.len(), "Readings refreshed");
        tick
    }

    pub async fn refresh_predictions(&self) {
        let mut session = self.session.write().await;
        let count = session.refresh_predictions().len();
        tracing::debug!(nodes = count, "Predictions refreshed");
    }

    pub async fn refresh_insights(&self) {
        self.session.write().await.refresh_insights();
        tracing::debug!("Insights refreshed");
    }

    pub async fn clear_alerts(&self) {
        self.session.write().await.clear_alerts();
    }

    /// Write `reading` as the node's current value and append it to its stored history.
    ///
    /// Failures are logged, never retried and never returned.
    pub async fn persist_reading(&self, reading: &Reading) {
        // ---
        let stamp = self.fence.read().await.stamp(&reading.node_id);
        self.persist_stamped(reading, stamp).await;
    }

    /// Persist unless a delete has cleared this node since `stamp` was taken.
    async fn persist_stamped(&self, reading: &Reading, stamp: Stamp) {
        // ---
        let fence = self.fence.read().await;
        if fence.stamp(&reading.node_id) != stamp {
            tracing::debug!(node_id = %reading.node_id, "Dropping write queued before a delete");
            return;
        }
        if let Err(e) = self.try_persist_reading(reading).await {
            tracing::error!(
                node_id = %reading.node_id,
                backend = self.gateway.backend(),
                error = %e,
                "Error saving reading"
            );
        }
    }

    async fn try_persist_reading(&self, reading: &Reading) -> Result<(), GatewayError> {
        // ---
        let value = serde_json::to_value(reading)?;
        self.gateway
            .write(&self.paths.current(&reading.node_id), &value)
            .await?;
        self.gateway
            .append(&self.paths.history(&reading.node_id), &value)
            .await?;
        Ok(())
    }

    /// Replace the active thresholds, re-check the current readings and store
    /// the config. Saves are applied and stored one at a time, in call order.
    /// A failed store write is logged; the live thresholds stay in effect.
    pub async fn save_thresholds(&self, thresholds: ThresholdConfig) {
        // ---
        let _ordered = self.threshold_writes.lock().await;
        let raised = self.session.write().await.set_thresholds(thresholds);
        tracing::info!(?thresholds, alerts = raised.len(), "Thresholds updated");

        let stored = match serde_json::to_value(thresholds) {
            Ok(value) => self.gateway.write(&self.paths.thresholds(), &value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = stored {
            tracing::error!(error = %e, "Error saving thresholds");
        }
    }

    /// Citizen reports, newest first. Empty when none exist or the store cannot be read.
    pub async fn load_requests(&self) -> Vec<PollutionRequest> {
        // ---
        match self.gateway.read(REQUESTS_PATH).await {
            Ok(Some(stored)) => requests::from_stored(stored),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Error fetching requests");
                Vec::new()
            }
        }
    }

    /// Stored history for `node_id` in append order. Empty when nothing is
    /// stored or the store cannot be read; malformed entries are skipped.
    pub async fn load_history(&self, node_id: &str) -> Vec<Reading> {
        // ---
        let stored = match self.gateway.read(&self.paths.history(node_id)).await {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(node_id, error = %e, "Error loading history");
                return Vec::new();
            }
        };

        let entries: Vec<Value> = match stored {
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            Value::Array(items) => items,
            _ => Vec::new(),
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Reading>(entry) {
                Ok(reading) => Some(reading),
                Err(e) => {
                    tracing::debug!(node_id, error = %e, "Skipping malformed history entry");
                    None
                }
            })
            .collect()
    }

    /// Remove everything stored for this user and reset live state.
    pub async fn delete_all_data(&self) -> Result<(), GatewayError> {
        // ---
        let mut fence = self.fence.write().await;
        if let Err(e) = self.gateway.delete(self.paths.root()).await {
            tracing::error!(error = %e, "Error deleting all data");
            return Err(e);
        }
        fence.all += 1;
        self.session.write().await.reset();
        tracing::info!("All stored data deleted");
        Ok(())
    }

    /// Remove everything stored for one node and drop its live state.
    pub async fn delete_node_data(&self, node_id: &str) -> Result<(), GatewayError> {
        // ---
        let mut fence = self.fence.write().await;
        if let Err(e) = self.gateway.delete(&self.paths.node(node_id)).await {
            tracing::error!(node_id, error = %e, "Error deleting node data");
            return Err(e);
        }
        *fence.nodes.entry(node_id.to_string()).or_default() += 1;
        self.session.write().await.forget_node(node_id);
        tracing::info!(node_id, "Node data deleted");
        Ok(())
    }

    /// Start the three refresh tasks. They stop when the handle is dropped.
    pub fn spawn(&self, intervals: RefreshIntervals) -> MonitorHandle {
        // ---
        tracing::info!(?intervals, "Starting refresh tasks");

        let tasks = vec![
            self.every(intervals.readings, |m| async move {
                m.refresh_readings().await;
            }),
            self.every(intervals.predictions, |m| async move {
                m.refresh_predictions().await;
            }),
            self.every(intervals.insights, |m| async move {
                m.refresh_insights().await;
            }),
        ];

        MonitorHandle { tasks }
    }

    fn every<F, Fut>(&self, period: Duration, job: F) -> JoinHandle<()>
    where
        F: Fn(Monitor) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        // ---
        let monitor = self.clone();
        tokio::spawn(async move {
            // first run is one full period out; `start` already seeded state
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                job(monitor.clone()).await;
            }
        })
    }
}

/// Owns the refresh tasks. Dropping it (or calling [`shutdown`](Self::shutdown))
/// tears the timers down.
pub struct MonitorHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        tracing::info!("Refresh tasks stopped");
    }
}
