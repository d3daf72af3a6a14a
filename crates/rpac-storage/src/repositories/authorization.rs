#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::EquipmentAuthorization;
use chrono::Utc;
use rpac_core::{EquipmentId, Token};
use sqlx::SqlitePool;
use tracing::info;

/// Which tokens may power which equipment.
pub trait AuthorizationRepository: Send + Sync {
    /// Allow `token` on `equipment`. Granting an active permission changes nothing.
    async fn grant(&self, equipment: EquipmentId, token: &Token) -> StorageResult<()>;

    /// Withdraw the permission; returns `false` if none was active.
    async fn revoke(&self, equipment: EquipmentId, token: &Token) -> StorageResult<bool>;

    /// Whether an active permission exists.
    async fn is_authorized(&self, equipment: EquipmentId, token: &Token) -> StorageResult<bool>;

    /// Every permission row for `equipment`, active or not, oldest grant first.
    async fn list(&self, equipment: EquipmentId) -> StorageResult<Vec<EquipmentAuthorization>>;
}

/// SQLite implementation of [`AuthorizationRepository`]
#[derive(Debug, Clone)]
pub struct SqliteAuthorizationRepository {
    pool: SqlitePool,
}

impl SqliteAuthorizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AuthorizationRepository for SqliteAuthorizationRepository {
    async fn grant(&self, equipment: EquipmentId, token: &Token) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO equipment_authorizations (equipment_id, token, active, granted_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT (equipment_id, token) DO UPDATE SET
                granted_at = CASE WHEN active = 1 THEN granted_at ELSE excluded.granted_at END,
                revoked_at = NULL,
                active = 1
            "#,
        )
        .bind(i64::from(equipment.as_u32()))
        .bind(token.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!("Granted token {} on equipment {}", token.redacted(), equipment);
        Ok(())
    }

    async fn revoke(&self, equipment: EquipmentId, token: &Token) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE equipment_authorizations
            SET active = 0, revoked_at = ?
            WHERE equipment_id = ? AND token = ? AND active = 1
            "#,
        )
        .bind(Utc::now())
        .bind(i64::from(equipment.as_u32()))
        .bind(token.as_str())
        .execute(&self.pool)
        .await?;

        let revoked = result.rows_affected() > 0;
        if revoked {
            info!("Revoked token {} on equipment {}", token.redacted(), equipment);
        }
        Ok(revoked)
    }

    async fn is_authorized(&self, equipment: EquipmentId, token: &Token) -> StorageResult<bool> {
        let authorized = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM equipment_authorizations
                WHERE equipment_id = ? AND token = ? AND active = 1
            )
            "#,
        )
        .bind(i64::from(equipment.as_u32()))
        .bind(token.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(authorized)
    }

    async fn list(&self, equipment: EquipmentId) -> StorageResult<Vec<EquipmentAuthorization>> {
        let rows = sqlx::query_as::<_, EquipmentAuthorization>(
            r#"
            SELECT id, equipment_id, token, active, granted_at, revoked_at
            FROM equipment_authorizations
            WHERE equipment_id = ?
            ORDER BY granted_at ASC, id ASC
            "#,
        )
        .bind(i64::from(equipment.as_u32()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
