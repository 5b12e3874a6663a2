//! Persistence gateway: a path-addressed JSON document store.
//!
//! The monitor only needs four operations (overwrite, append to an ordered
//! log, read a subtree, recursive delete), so the backend is swappable:
//! - [`MemoryGateway`] keeps everything in process (default, tests)
//! - [`PostgresGateway`] stores one row per written path via `sqlx`
//! - [`RestGateway`] talks to a Firebase-style realtime database over HTTPS
//!
//! Paths are `/`-separated and namespaced by user then node, see [`StorePaths`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::config::StoreBackend;

mod memory;
mod postgres;
mod rest;
mod tree;

pub use memory::MemoryGateway;
pub use postgres::PostgresGateway;
pub use rest::RestGateway;

// ---

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid store path: {0:?}")]
    InvalidPath(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status} for {path}")]
    Status { path: String, status: u16 },
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Overwrite the value at `path`, replacing any subtree below it.
    async fn write(&self, path: &str, value: &Value) -> Result<(), GatewayError>;

    /// Add `value` as a new child of `path`; returns the generated child key.
    /// Child keys sort in append order.
    async fn append(&self, path: &str, value: &Value) -> Result<String, GatewayError>;

    /// The value (or assembled subtree) at `path`, `None` when nothing is stored.
    async fn read(&self, path: &str) -> Result<Option<Value>, GatewayError>;

    /// Remove `path` and everything below it. Deleting a missing path is not an error.
    async fn delete(&self, path: &str) -> Result<(), GatewayError>;
}

/// Build the gateway selected by configuration.
pub async fn connect(store: &StoreBackend) -> Result<Arc<dyn PersistenceGateway>> {
    // ---
    let gateway: Arc<dyn PersistenceGateway> = match store {
        StoreBackend::Memory => Arc::new(MemoryGateway::new()),
        StoreBackend::Postgres { db_url, pool_max } => {
            Arc::new(PostgresGateway::connect(db_url, *pool_max).await?)
        }
        StoreBackend::Rest { base_url, auth_token } => {
            Arc::new(RestGateway::new(base_url, auth_token.clone())?)
        }
    };

    tracing::info!("Persistence gateway ready: {}", gateway.backend());
    Ok(gateway)
}

// ---

/// Split and validate a store path.
///
/// Segments must be non-empty and free of the characters realtime-database
/// keys reject (`.`, `#`, `$`, `[`, `]`).
pub(crate) fn segments(path: &str) -> Result<Vec<&str>, GatewayError> {
    // ---
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    let valid = parts.iter().all(|s| {
        !s.is_empty() && !s.chars().any(|c| matches!(c, '.' | '#' | '$' | '[' | ']'))
    });

    if valid {
        Ok(parts)
    } else {
        Err(GatewayError::InvalidPath(path.to_string()))
    }
}

/// Time-ordered child key for `append`: millisecond timestamp plus a
/// process-wide sequence so keys created in the same millisecond still sort.
pub(crate) fn push_key() -> String {
    // ---
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed) % 1_000_000;
    format!("{:013}-{:06}", Utc::now().timestamp_millis(), seq)
}

/// Store keys cannot contain `.`, so e-mail identities are rewritten.
pub fn user_key(user_id: &str) -> String {
    user_id.replace('.', "_")
}

/// Shared collection of citizen pollution reports, outside any user's tree.
pub const REQUESTS_PATH: &str = "requests";

/// Path layout for one user's data.
#[derive(Debug, Clone)]
pub struct StorePaths {
    root: String,
}

impl StorePaths {
    pub fn new(user_id: &str) -> Self {
        Self {
            root: format!("users/{}", user_key(user_id)),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn node(&self, node_id: &str) -> String {
        format!("{}/nodes/{}", self.root, node_id)
    }

    pub fn current(&self, node_id: &str) -> String {
        format!("{}/current", self.node(node_id))
    }

    pub fn history(&self, node_id: &str) -> String {
        format!("{}/history", self.node(node_id))
    }

    pub fn thresholds(&self) -> String {
        format!("{}/settings/thresholds", self.root)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_store_paths() {
        // ---
        let paths = StorePaths::new("ops.lead@plant.example");
        assert_eq!(paths.root(), "users/ops_lead@plant_example");
        assert_eq!(
            paths.current("Node_A"),
            "users/ops_lead@plant_example/nodes/Node_A/current"
        );
        assert_eq!(
            paths.history("Node_C"),
            "users/ops_lead@plant_example/nodes/Node_C/history"
        );
        assert_eq!(
            paths.thresholds(),
            "users/ops_lead@plant_example/settings/thresholds"
        );
    }

    #[test]
    fn test_segments_validation() {
        // ---
        assert_eq!(segments("/users/a/nodes/").unwrap(), vec!["users", "a", "nodes"]);
        assert!(segments("").is_err());
        assert!(segments("users//a").is_err());
        assert!(segments("users/a.b").is_err());
        assert!(segments("users/$id").is_err());
    }

    #[test]
    fn test_push_keys_sort_in_creation_order() {
        // ---
        let keys: Vec<String> = (0..50).map(|_| push_key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
