use thiserror::Error;

/// Errors from the authorization store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored or supplied data failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<rpac_core::Error> for StorageError {
    fn from(e: rpac_core::Error) -> Self {
        StorageError::Validation(e.to_string())
    }
}

/// Store failures reach the controller as service errors, which it treats as
/// denials.
impl From<StorageError> for rpac_core::Error {
    fn from(e: StorageError) -> Self {
        rpac_core::Error::AuthService(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_becomes_auth_service_error() {
        let error: rpac_core::Error = StorageError::Configuration("no path".into()).into();
        assert!(matches!(error, rpac_core::Error::AuthService(_)));
        assert!(error.is_auth_failure());
    }
}
