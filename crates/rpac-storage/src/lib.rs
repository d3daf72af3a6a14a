//! Local authorization store for the RFID power access controller.
//!
//! SQLite-backed persistence for which tokens may power which equipment,
//! plus an audit log of every authentication attempt. [`SqliteAuthenticator`]
//! plugs the store into the controller through the
//! [`Authenticator`](rpac_core::Authenticator) seam.
//!
//! # Examples
//!
//! ```no_run
//! use rpac_core::{EquipmentId, Token};
//! use rpac_storage::repositories::{AuthorizationRepository, SqliteAuthorizationRepository};
//! use rpac_storage::{Database, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("rpac.db")).await?;
//! let authorizations = SqliteAuthorizationRepository::new(db.pool().clone());
//!
//! let equipment = EquipmentId::new(1)?;
//! let token = Token::parse("ABCD123456")?;
//! authorizations.grant(equipment, &token).await?;
//! assert!(authorizations.is_authorized(equipment, &token).await?);
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use authenticator::SqliteAuthenticator;
pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AuthLogEntry, AuthOutcome, EquipmentAuthorization};
pub use repositories::{
    AuthLogRepository, AuthorizationRepository, SqliteAuthLogRepository,
    SqliteAuthorizationRepository,
};
