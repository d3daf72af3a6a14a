pub mod auth_log;
pub mod authorization;

pub use auth_log::{AuthLogEntry, AuthOutcome};
pub use authorization::EquipmentAuthorization;
