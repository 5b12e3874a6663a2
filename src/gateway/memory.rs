use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{push_key, segments, tree, GatewayError, PersistenceGateway};

// ---

/// In-process document tree. Data lives as long as the process.
#[derive(Debug)]
pub struct MemoryGateway {
    root: RwLock<Value>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(json!({})),
        }
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    // ---
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), GatewayError> {
        // ---
        let parts = segments(path)?;
        tree::set(&mut *self.root.write().await, &parts, value.clone());
        Ok(())
    }

    async fn append(&self, path: &str, value: &Value) -> Result<String, GatewayError> {
        // ---
        let key = push_key();
        let mut parts = segments(path)?;
        parts.push(&key);
        tree::set(&mut *self.root.write().await, &parts, value.clone());
        Ok(key)
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, GatewayError> {
        // ---
        let parts = segments(path)?;
        let root = self.root.read().await;
        Ok(tree::get(&root, &parts).cloned())
    }

    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        // ---
        let parts = segments(path)?;
        if tree::remove(&mut *self.root.write().await, &parts) {
            tracing::debug!("memory store: removed {}", path);
        }
        Ok(())
    }
}
