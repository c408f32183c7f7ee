//! Postgres-backed record store.
//!
//! Each collection is a table with a text `id` primary key; the whole row is
//! returned as a JSON object so callers see the same shape as other backends.

use sqlx::{PgPool, Row};

use super::records::{Record, RecordStore, StoreError};

/// Collections that map to tables. Anything else reads as "not found".
const TABLES: &[&str] = &["users"];

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        let Some(table) = TABLES.iter().find(|t| **t == collection) else {
            return Ok(None);
        };
        let sql = format!("SELECT to_jsonb(t) AS doc FROM {table} t WHERE t.id = $1");
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let doc: serde_json::Value = row
            .try_get("doc")
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        match doc {
            serde_json::Value::Object(map) => Ok(Some(map)),
            other => Err(StoreError::Decode(format!("expected object row, got {other}"))),
        }
    }
}
