//! Database schema management for the Postgres persistence backend.
//!
//! Ensures the document table and its indexes exist before the gateway is
//! handed to the monitor. Applied once from `PostgresGateway::connect`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `documents` table: one JSONB value per written store path.
/// Safe to call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Every write/append lands here keyed by its full slash-separated path
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            path        TEXT        PRIMARY KEY,
            value       JSONB       NOT NULL,
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Prefix scans for subtree reads and recursive deletes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_documents_path_prefix
            ON documents (path text_pattern_ops);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
