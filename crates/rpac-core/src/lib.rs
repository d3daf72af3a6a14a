pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use auth::Authenticator;
pub use config::{ButtonOffPolicy, ControllerConfig, SerialConfig};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
