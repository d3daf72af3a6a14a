//! Controller configuration.
//!
//! All timing values are stored in milliseconds so a JSON file can override
//! any subset of them; accessor methods return [`Duration`]s.
//!
//! ```
//! use rpac_core::config::ControllerConfig;
//! use std::time::Duration;
//!
//! let config = ControllerConfig::from_json_str(r#"{ "warning_window_ms": 5000 }"#).unwrap();
//! assert_eq!(config.warning_window(), Duration::from_secs(5));
//! assert_eq!(config.reauth_interval(), Duration::from_secs(30));
//! ```

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::EquipmentId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What a power-button switch-off does while the equipment is authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonOffPolicy {
    /// Drop relay power and sit idle until the button comes back on.
    #[default]
    Idle,

    /// Start a disconnect warning; the button coming back on resolves it.
    Warn,
}

/// Serial line settings for the RFID reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path
    pub port: String,

    /// Line speed in baud
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Equipment gated by this controller
    pub equipment_id: EquipmentId,

    /// Input debounce window
    pub debounce_ms: u64,

    /// Time allowed for one token read
    pub read_timeout_ms: u64,

    /// Granularity at which a running read checks for cancellation
    pub read_poll_interval_ms: u64,

    /// Failed reads tolerated per session
    pub max_read_attempts: u32,

    /// Interval between token re-checks while authorized
    pub reauth_interval_ms: u64,

    /// Grace period before forced disconnect
    pub warning_window_ms: u64,

    /// Delay between relay write and settle check
    pub relay_settle_delay_ms: u64,

    /// Relay writes attempted before raising a fault
    pub relay_max_attempts: u32,

    /// Period of the relay sequencer loop
    pub relay_poll_interval_ms: u64,

    /// Period of the access control tick loop
    pub tick_interval_ms: u64,

    /// Upper bound on one authentication call
    pub auth_timeout_ms: u64,

    /// Reaction to the power button switching off while authorized
    pub button_off_policy: ButtonOffPolicy,

    /// RFID reader serial line
    pub serial: SerialConfig,

    /// Local authorization database
    pub database_path: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            equipment_id: EquipmentId(DEFAULT_EQUIPMENT_ID),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            read_poll_interval_ms: DEFAULT_READ_POLL_INTERVAL_MS,
            max_read_attempts: DEFAULT_MAX_READ_ATTEMPTS,
            reauth_interval_ms: DEFAULT_REAUTH_INTERVAL_MS,
            warning_window_ms: DEFAULT_WARNING_WINDOW_MS,
            relay_settle_delay_ms: DEFAULT_RELAY_SETTLE_DELAY_MS,
            relay_max_attempts: DEFAULT_RELAY_MAX_ATTEMPTS,
            relay_poll_interval_ms: DEFAULT_RELAY_POLL_INTERVAL_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            auth_timeout_ms: DEFAULT_AUTH_TIMEOUT_MS,
            button_off_policy: ButtonOffPolicy::default(),
            serial: SerialConfig::default(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a configuration from JSON text.
    ///
    /// # Errors
    /// Returns `Error::ConfigParse` for malformed JSON and `Error::Config`
    /// when a value fails validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check every value for a usable range.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&self.debounce_ms) {
            return Err(Error::Config(format!(
                "debounce_ms must be {MIN_DEBOUNCE_MS}-{MAX_DEBOUNCE_MS}, got {}",
                self.debounce_ms
            )));
        }

        let durations = [
            ("read_timeout_ms", self.read_timeout_ms),
            ("read_poll_interval_ms", self.read_poll_interval_ms),
            ("reauth_interval_ms", self.reauth_interval_ms),
            ("warning_window_ms", self.warning_window_ms),
            ("relay_settle_delay_ms", self.relay_settle_delay_ms),
            ("relay_poll_interval_ms", self.relay_poll_interval_ms),
            ("tick_interval_ms", self.tick_interval_ms),
            ("auth_timeout_ms", self.auth_timeout_ms),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }

        if self.max_read_attempts == 0 {
            return Err(Error::Config(
                "max_read_attempts must be greater than zero".to_string(),
            ));
        }
        if self.relay_max_attempts == 0 {
            return Err(Error::Config(
                "relay_max_attempts must be greater than zero".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("serial.baud_rate must be non-zero".to_string()));
        }

        Ok(())
    }

    pub fn with_equipment_id(mut self, id: EquipmentId) -> Self {
        self.equipment_id = id;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn with_read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    pub fn with_max_read_attempts(mut self, attempts: u32) -> Self {
        self.max_read_attempts = attempts;
        self
    }

    pub fn with_reauth_interval_ms(mut self, ms: u64) -> Self {
        self.reauth_interval_ms = ms;
        self
    }

    pub fn with_warning_window_ms(mut self, ms: u64) -> Self {
        self.warning_window_ms = ms;
        self
    }

    pub fn with_relay_settle_delay_ms(mut self, ms: u64) -> Self {
        self.relay_settle_delay_ms = ms;
        self
    }

    pub fn with_relay_max_attempts(mut self, attempts: u32) -> Self {
        self.relay_max_attempts = attempts;
        self
    }

    pub fn with_button_off_policy(mut self, policy: ButtonOffPolicy) -> Self {
        self.button_off_policy = policy;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn read_poll_interval(&self) -> Duration {
        Duration::from_millis(self.read_poll_interval_ms)
    }

    pub fn reauth_interval(&self) -> Duration {
        Duration::from_millis(self.reauth_interval_ms)
    }

    pub fn warning_window(&self) -> Duration {
        Duration::from_millis(self.warning_window_ms)
    }

    pub fn relay_settle_delay(&self) -> Duration {
        Duration::from_millis(self.relay_settle_delay_ms)
    }

    pub fn relay_poll_interval(&self) -> Duration {
        Duration::from_millis(self.relay_poll_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }
}
