#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::AuthLogEntry;
use rpac_core::EquipmentId;
use sqlx::SqlitePool;

/// Audit trail of authentication attempts.
pub trait AuthLogRepository: Send + Sync {
    /// Append an entry; returns its row id.
    async fn record(&self, entry: &AuthLogEntry) -> StorageResult<i64>;

    /// Up to `limit` most recent entries for `equipment`, newest first.
    async fn recent(&self, equipment: EquipmentId, limit: i64) -> StorageResult<Vec<AuthLogEntry>>;
}

/// SQLite implementation of [`AuthLogRepository`]
#[derive(Debug, Clone)]
pub struct SqliteAuthLogRepository {
    pool: SqlitePool,
}

impl SqliteAuthLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AuthLogRepository for SqliteAuthLogRepository {
    async fn record(&self, entry: &AuthLogEntry) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO authentication_log (equipment_id, token, outcome, detail, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.equipment_id)
        .bind(&entry.token)
        .bind(entry.outcome)
        .bind(&entry.detail)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn recent(&self, equipment: EquipmentId, limit: i64) -> StorageResult<Vec<AuthLogEntry>> {
        let entries = sqlx::query_as::<_, AuthLogEntry>(
            r#"
            SELECT id, equipment_id, token, outcome, detail, timestamp
            FROM authentication_log
            WHERE equipment_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(equipment.as_u32()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
