//! Core constants for the equipment access controller.
//!
//! This module centralizes the RFID framing bytes and every timing default
//! used by the controller. Configuration values in
//! [`ControllerConfig`](crate::config::ControllerConfig) fall back to these
//! when a field is not provided.
//!
//! # RFID Frame Structure
//!
//! The reader emits one fixed-length frame per credential read:
//!
//! ```text
//! <STX> P P P P P P P P P P <ETX>
//! 0x02  10 payload bytes    0x03
//! ```
//!
//! # Usage
//!
//! ```
//! use rpac_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(FRAME_LENGTH, TOKEN_LENGTH + 2);
//! let timeout = Duration::from_millis(DEFAULT_READ_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 10);
//! ```

// ============================================================================
// RFID Framing
// ============================================================================

/// Start of text marker opening every RFID frame.
pub const START_BYTE: u8 = 0x02;

/// End of text marker closing every RFID frame.
pub const END_BYTE: u8 = 0x03;

/// Number of payload characters in a token.
pub const TOKEN_LENGTH: usize = 10;

/// Total frame length on the wire (STX + payload + ETX).
pub const FRAME_LENGTH: usize = TOKEN_LENGTH + 2;

/// Serial line speed of the RFID reader.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Serial device the reader is attached to.
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyAMA0";

// ============================================================================
// Input Debounce
// ============================================================================

/// Debounce window for presence and power-button inputs (milliseconds).
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Smallest accepted debounce window (milliseconds).
pub const MIN_DEBOUNCE_MS: u64 = 10;

/// Largest accepted debounce window (milliseconds).
pub const MAX_DEBOUNCE_MS: u64 = 1000;

// ============================================================================
// Token Reads
// ============================================================================

/// Time allowed for one token read attempt (milliseconds).
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10_000;

/// Maximum wait for a single byte before the cancel predicate is re-checked
/// (milliseconds).
pub const DEFAULT_READ_POLL_INTERVAL_MS: u64 = 50;

/// Consecutive failed reads before the session gives up.
pub const DEFAULT_MAX_READ_ATTEMPTS: u32 = 5;

// ============================================================================
// Authorization Lifecycle
// ============================================================================

/// Interval between token re-checks while authorized (milliseconds).
pub const DEFAULT_REAUTH_INTERVAL_MS: u64 = 30_000;

/// Grace period between a warning and forced disconnect (milliseconds).
pub const DEFAULT_WARNING_WINDOW_MS: u64 = 30_000;

/// Upper bound on a single authentication call (milliseconds).
pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 5_000;

/// Period of the access control tick loop (milliseconds).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

// ============================================================================
// Relay Sequencing
// ============================================================================

/// Delay between a relay write and the settle check (milliseconds).
pub const DEFAULT_RELAY_SETTLE_DELAY_MS: u64 = 1_000;

/// Relay writes attempted before a fault is raised.
pub const DEFAULT_RELAY_MAX_ATTEMPTS: u32 = 5;

/// Period of the relay sequencer loop (milliseconds).
pub const DEFAULT_RELAY_POLL_INTERVAL_MS: u64 = 50;

// ============================================================================
// Identity
// ============================================================================

/// Equipment identifier used when none is configured.
pub const DEFAULT_EQUIPMENT_ID: u32 = 1;

/// Default SQLite database for the local authorization store.
pub const DEFAULT_DATABASE_PATH: &str = "rpac.db";
