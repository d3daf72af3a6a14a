pub mod auth_log;
pub mod authorization;

pub use auth_log::{AuthLogRepository, SqliteAuthLogRepository};
pub use authorization::{AuthorizationRepository, SqliteAuthorizationRepository};
