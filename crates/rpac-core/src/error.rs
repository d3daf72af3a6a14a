use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Credential errors
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid equipment id: {0}")]
    InvalidEquipmentId(String),

    #[error("Token read failed after {attempts} attempts")]
    ReadMaxAttemptsExceeded { attempts: u32 },

    // Authentication errors
    #[error("Authentication service error: {0}")]
    AuthService(String),

    #[error("Access denied for token {token} on equipment {equipment}")]
    AuthDenied { equipment: u32, token: String },

    // Power errors
    #[error("Relay did not settle to {requested} after {attempts} attempts")]
    RelayFault { requested: bool, attempts: u32 },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error should be treated as a denial by the access logic.
    ///
    /// Authentication is fail-closed: a service failure never grants power.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::AuthService(_) | Error::AuthDenied { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
