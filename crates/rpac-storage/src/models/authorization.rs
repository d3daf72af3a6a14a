use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A token's permission to power one piece of equipment.
///
/// Rows are never deleted: revoking clears `active` and stamps `revoked_at`,
/// and granting again re-activates the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EquipmentAuthorization {
    /// Auto-increment primary key
    pub id: i64,

    /// Equipment the token may power
    pub equipment_id: i64,

    /// Ten-character credential
    pub token: String,

    /// Whether the permission is currently in force
    pub active: bool,

    /// When the permission was last granted
    pub granted_at: DateTime<Utc>,

    /// When the permission was revoked, if it is inactive
    pub revoked_at: Option<DateTime<Utc>>,
}
