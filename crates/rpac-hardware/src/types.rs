//! Common types shared across pin and serial implementations.
//!
//! This module defines the logical signal names monitored by the debouncer
//! and the LED vocabulary used by indicator patterns.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Logical input signals watched by the debounced input monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Credential carrier is physically inserted.
    Presence,

    /// Equipment power button is latched on.
    PowerButton,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Presence => write!(f, "presence"),
            Self::PowerButton => write!(f, "power-button"),
        }
    }
}

/// LED colors available on the enclosure's RGB status light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedColor {
    /// LED off.
    Off,

    /// Red LED.
    Red,

    /// Green LED.
    Green,

    /// Blue LED.
    Blue,

    /// Red and green together.
    Yellow,

    /// Red and blue together.
    Purple,
}

impl LedColor {
    /// Get the RGB channel levels for this color.
    pub fn as_rgb(&self) -> (bool, bool, bool) {
        match self {
            Self::Off => (false, false, false),
            Self::Red => (true, false, false),
            Self::Green => (false, true, false),
            Self::Blue => (false, false, true),
            Self::Yellow => (true, true, false),
            Self::Purple => (true, false, true),
        }
    }
}

/// Blink cadence of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkRate {
    /// Steady on color.
    Solid,

    /// One second per phase.
    Slow,

    /// 100 ms per phase.
    Fast,
}

impl BlinkRate {
    /// Duration of one on or off phase, `None` for a steady light.
    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::Solid => None,
            Self::Slow => Some(Duration::from_millis(1000)),
            Self::Fast => Some(Duration::from_millis(100)),
        }
    }
}
