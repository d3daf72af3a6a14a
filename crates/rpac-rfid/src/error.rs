//! Error type for token reads.

use rpac_hardware::HardwareError;

/// Result type alias for token reads.
pub type Result<T> = std::result::Result<T, ReadError>;

/// Why a read attempt produced no token.
///
/// Every variant counts as one failed attempt for the caller's retry ceiling.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// No complete frame arrived before the deadline.
    #[error("No token frame within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The cancel predicate fired before a frame completed.
    #[error("Token read aborted")]
    Aborted,

    /// Reader power or the serial line failed.
    #[error("Reader hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

impl ReadError {
    /// Create a new timeout error.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Whether this failure was a caller cancellation.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}
