//! Local authorization store as the controller's authenticator.

use crate::connection::Database;
use crate::models::{AuthLogEntry, AuthOutcome};
use crate::repositories::{
    AuthLogRepository, AuthorizationRepository, SqliteAuthLogRepository,
    SqliteAuthorizationRepository,
};
use chrono::Utc;
use rpac_core::{Authenticator, EquipmentId, Token};
use tracing::{error, warn};

/// Answers authentication requests from the SQLite store and logs each one.
///
/// A lookup failure is returned as `Error::AuthService`, which the controller
/// treats as a denial. A failure to write the log entry is only warned about.
#[derive(Debug, Clone)]
pub struct SqliteAuthenticator {
    authorizations: SqliteAuthorizationRepository,
    log: SqliteAuthLogRepository,
}

impl SqliteAuthenticator {
    pub fn new(db: &Database) -> Self {
        Self {
            authorizations: SqliteAuthorizationRepository::new(db.pool().clone()),
            log: SqliteAuthLogRepository::new(db.pool().clone()),
        }
    }
}

impl Authenticator for SqliteAuthenticator {
    async fn authenticate(&self, equipment: EquipmentId, token: &Token) -> rpac_core::Result<bool> {
        let decision = self.authorizations.is_authorized(equipment, token).await;

        let (outcome, detail) = match &decision {
            Ok(true) => (AuthOutcome::Granted, None),
            Ok(false) => (AuthOutcome::Denied, None),
            Err(e) => {
                error!("Authorization lookup failed: {}", e);
                (AuthOutcome::Error, Some(e.to_string()))
            }
        };

        let entry = AuthLogEntry::new(equipment, token, outcome, detail, Utc::now());
        if let Err(e) = self.log.record(&entry).await {
            warn!("Failed to record authentication attempt: {}", e);
        }

        decision.map_err(Into::into)
    }
}
