//! Error types for hardware operations.
//!
//! This module defines error types for pin and serial access, covering
//! disconnection, timeouts, line errors, and misconfiguration.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Serial or pin communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// An output did not reach the written level.
    #[error("Output {pin} did not settle to {expected}")]
    NotSettled { pin: String, expected: bool },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Device configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new not-settled error.
    pub fn not_settled(pin: impl Into<String>, expected: bool) -> Self {
        Self::NotSettled {
            pin: pin.into(),
            expected,
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}

#[cfg(feature = "hardware-serial")]
impl From<serialport::Error> for HardwareError {
    fn from(error: serialport::Error) -> Self {
        match error.kind() {
            serialport::ErrorKind::NoDevice => Self::disconnected(error.description),
            serialport::ErrorKind::InvalidInput => Self::configuration(error.description),
            _ => Self::communication(error.description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("/dev/ttyAMA0");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: /dev/ttyAMA0");
    }

    #[test]
    fn test_timeout_error() {
        let error = HardwareError::timeout(10000);
        assert_eq!(error.to_string(), "Operation timeout after 10000ms");
    }

    #[test]
    fn test_not_settled_error() {
        let error = HardwareError::not_settled("rfid-power", true);
        assert_eq!(error.to_string(), "Output rfid-power did not settle to true");
    }

    #[test]
    fn test_communication_error() {
        let error = HardwareError::communication("Serial port closed");
        assert!(matches!(error, HardwareError::CommunicationError { .. }));
        assert_eq!(error.to_string(), "Communication error: Serial port closed");
    }
}
