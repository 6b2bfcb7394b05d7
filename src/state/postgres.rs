//! Postgres-backed session slot
//!
//! One row in `session_slots`, keyed by the slot name. The pool is created
//! lazily and the table on first use.

use super::{SessionStore, SLOT_KEY};
use crate::error::WizardError;
use crate::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct PostgresSessionStore {
    pool: PgPool,
    slot_key: String,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresSessionStore {
    /// Build a store without connecting; the first query opens the pool.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(url)
            .map_err(|e| WizardError::DatabaseError(format!("Invalid postgres URL: {}", e)))?;

        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            pool,
            slot_key: SLOT_KEY.to_string(),
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS session_slots (
                      slot_key TEXT PRIMARY KEY,
                      payload TEXT NOT NULL,
                      updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                WizardError::DatabaseError(format!("Failed to initialize session slot schema: {}", e))
            })?;

        Ok(())
    }
}

fn db_error(action: &str, e: sqlx::Error) -> WizardError {
    WizardError::DatabaseError(format!("Failed to {} session slot: {}", action, e))
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn read_record(&self) -> Result<Option<String>> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT payload FROM session_slots WHERE slot_key = $1")
            .bind(&self.slot_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("read", e))?;

        match row {
            Some(row) => {
                let payload: String = row.try_get("payload").map_err(|e| db_error("decode", e))?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    async fn write_record(&self, record: &str) -> Result<()> {
        self.ensure_schema().await?;

        sqlx::query(
            r#"
            INSERT INTO session_slots (slot_key, payload, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (slot_key)
            DO UPDATE SET payload = EXCLUDED.payload, updated_at = NOW()
            "#,
        )
        .bind(&self.slot_key)
        .bind(record)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("write", e))?;

        debug!(slot = %self.slot_key, bytes = record.len(), "Session slot upserted");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.ensure_schema().await?;

        sqlx::query("DELETE FROM session_slots WHERE slot_key = $1")
            .bind(&self.slot_key)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("clear", e))?;

        Ok(())
    }
}
