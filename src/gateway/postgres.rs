use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{push_key, segments, tree, GatewayError, PersistenceGateway};
use crate::schema;

// ---

/// Document store on a single Postgres table, one row per written path.
///
/// A read assembles the row at the path (if any) with every row below it;
/// when neither exists the closest ancestor document is searched instead.
#[derive(Debug, Clone)]
pub struct PostgresGateway {
    pool: PgPool,
}

impl PostgresGateway {
    /// Connect, then make sure the `documents` table exists.
    pub async fn connect(db_url: &str, pool_max: u32) -> Result<Self> {
        // ---
        tracing::info!("Attempting to connect to database");

        let pool = PgPoolOptions::new()
            .max_connections(pool_max)
            .connect(db_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

        tracing::info!("Successfully connected to database");

        schema::create_schema(&pool).await?;
        Ok(Self { pool })
    }
}

/// `LIKE` pattern matching every path strictly below `path`.
fn descendants_pattern(path: &str) -> String {
    // ---
    let escaped = path
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{escaped}/%")
}

fn ancestors(parts: &[&str]) -> Vec<String> {
    (1..parts.len()).map(|i| parts[..i].join("/")).collect()
}

#[async_trait]
impl PersistenceGateway for PostgresGateway {
    // ---
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), GatewayError> {
        // ---
        let parts = segments(path)?;
        let path = parts.join("/");
        let mut tx = self.pool.begin().await?;

        // The new value replaces the whole subtree ...
        sqlx::query(r#"DELETE FROM documents WHERE path = $1 OR path LIKE $2 ESCAPE '\'"#)
            .bind(&path)
            .bind(descendants_pattern(&path))
            .execute(&mut *tx)
            .await?;

        // ... and any ancestor stored as a single document.
        sqlx::query("DELETE FROM documents WHERE path = ANY($1)")
            .bind(ancestors(&parts))
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO documents (path, value) VALUES ($1, $2)
            ON CONFLICT (path) DO UPDATE SET
                value      = EXCLUDED.value,
                updated_at = now()
            "#,
        )
        .bind(&path)
        .bind(Json(value))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn append(&self, path: &str, value: &Value) -> Result<String, GatewayError> {
        // ---
        let key = push_key();
        let parent = segments(path)?.join("/");
        self.write(&format!("{parent}/{key}"), value).await?;
        Ok(key)
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, GatewayError> {
        // ---
        let parts = segments(path)?;
        let path = parts.join("/");

        let rows: Vec<(String, Json<Value>)> = sqlx::query_as(
            r#"
            SELECT path, value FROM documents
            WHERE path = $1 OR path LIKE $2 ESCAPE '\'
            ORDER BY path
            "#,
        )
        .bind(&path)
        .bind(descendants_pattern(&path))
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            let ancestor: Option<(String, Json<Value>)> = sqlx::query_as(
                "SELECT path, value FROM documents WHERE path = ANY($1) ORDER BY length(path) DESC LIMIT 1",
            )
            .bind(ancestors(&parts))
            .fetch_optional(&self.pool)
            .await?;

            return Ok(ancestor.and_then(|(anc_path, Json(doc))| {
                let depth = anc_path.split('/').count();
                tree::get(&doc, &parts[depth..]).cloned()
            }));
        }

        let mut assembled = Value::Null;
        for (row_path, Json(value)) in rows {
            let rel: Vec<&str> = row_path[path.len()..]
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();
            tree::set(&mut assembled, &rel, value);
        }
        Ok(Some(assembled))
    }

    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        // ---
        let path = segments(path)?.join("/");

        let result =
            sqlx::query(r#"DELETE FROM documents WHERE path = $1 OR path LIKE $2 ESCAPE '\'"#)
                .bind(&path)
                .bind(descendants_pattern(&path))
                .execute(&self.pool)
                .await?;

        tracing::debug!("postgres store: removed {} rows under {}", result.rows_affected(), path);
        Ok(())
    }
}
