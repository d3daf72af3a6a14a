//! Indicator codes and the sink that renders them.
//!
//! The controller speaks in symbolic codes. How a code becomes light or
//! sound is up to the sink; [`IndicatorCode::pattern`] gives the standard
//! RGB LED rendering.

use parking_lot::Mutex;
use rpac_hardware::{BlinkRate, LedColor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Symbolic indicator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCode {
    /// No credential inserted.
    Idle,

    /// Grace window running before disconnect.
    Warning,

    /// Credential denied, or power being cut.
    Unauthorized,

    /// Authorized with power on.
    AuthorizedOn,

    /// Authorized, power button off.
    AuthorizedPowerOff,

    /// Waiting on the authentication service.
    Authenticating,

    /// Waiting for the reader to produce a token.
    ReadingToken,

    /// Controller booting.
    Startup,

    /// Read attempts exhausted or relay fault.
    Fault,
}

/// LED rendering of an indicator code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPattern {
    /// Color during the on phase.
    pub on: LedColor,
    /// Color during the off phase.
    pub off: LedColor,
    /// Blink cadence.
    pub blink: BlinkRate,
}

impl IndicatorPattern {
    const fn new(on: LedColor, blink: BlinkRate) -> Self {
        Self {
            on,
            off: LedColor::Off,
            blink,
        }
    }
}

impl IndicatorCode {
    /// Standard LED pattern for this code.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpac_controller::IndicatorCode;
    /// use rpac_hardware::{BlinkRate, LedColor};
    ///
    /// let pattern = IndicatorCode::Warning.pattern();
    /// assert_eq!(pattern.on, LedColor::Red);
    /// assert_eq!(pattern.blink, BlinkRate::Slow);
    /// ```
    pub fn pattern(&self) -> IndicatorPattern {
        use BlinkRate::{Fast, Slow, Solid};
        use LedColor::{Green, Red, Yellow};

        match self {
            Self::Startup => IndicatorPattern::new(Yellow, Fast),
            Self::Idle => IndicatorPattern::new(Green, Slow),
            Self::ReadingToken => IndicatorPattern::new(Yellow, Slow),
            Self::Authenticating => IndicatorPattern::new(Yellow, Solid),
            Self::AuthorizedOn => IndicatorPattern::new(Green, Solid),
            Self::AuthorizedPowerOff => IndicatorPattern::new(Green, Fast),
            Self::Warning => IndicatorPattern::new(Red, Slow),
            Self::Unauthorized => IndicatorPattern::new(Red, Solid),
            Self::Fault => IndicatorPattern::new(Red, Fast),
        }
    }
}

impl fmt::Display for IndicatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Warning => "Warning",
            Self::Unauthorized => "Unauthorized",
            Self::AuthorizedOn => "AuthorizedOn",
            Self::AuthorizedPowerOff => "AuthorizedPowerOff",
            Self::Authenticating => "Authenticating",
            Self::ReadingToken => "ReadingToken",
            Self::Startup => "Startup",
            Self::Fault => "Fault",
        };
        write!(f, "{}", name)
    }
}

/// Renders indicator codes.
///
/// Called from the controller tick, so implementations must return quickly.
pub trait IndicatorSink: Send + Sync {
    /// Show `code`.
    fn set_indicator(&self, code: IndicatorCode);
}

impl<T: IndicatorSink + ?Sized> IndicatorSink for Arc<T> {
    fn set_indicator(&self, code: IndicatorCode) {
        (**self).set_indicator(code)
    }
}

/// Sink that keeps every code it receives.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingIndicator {
    codes: Arc<Mutex<Vec<IndicatorCode>>>,
}

impl RecordingIndicator {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All codes received, oldest first.
    pub fn codes(&self) -> Vec<IndicatorCode> {
        self.codes.lock().clone()
    }

    /// Most recent code.
    pub fn current(&self) -> Option<IndicatorCode> {
        self.codes.lock().last().copied()
    }
}

impl IndicatorSink for RecordingIndicator {
    fn set_indicator(&self, code: IndicatorCode) {
        self.codes.lock().push(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(IndicatorCode::Startup, LedColor::Yellow, BlinkRate::Fast)]
    #[case(IndicatorCode::Idle, LedColor::Green, BlinkRate::Slow)]
    #[case(IndicatorCode::ReadingToken, LedColor::Yellow, BlinkRate::Slow)]
    #[case(IndicatorCode::Authenticating, LedColor::Yellow, BlinkRate::Solid)]
    #[case(IndicatorCode::AuthorizedOn, LedColor::Green, BlinkRate::Solid)]
    #[case(IndicatorCode::AuthorizedPowerOff, LedColor::Green, BlinkRate::Fast)]
    #[case(IndicatorCode::Warning, LedColor::Red, BlinkRate::Slow)]
    #[case(IndicatorCode::Unauthorized, LedColor::Red, BlinkRate::Solid)]
    #[case(IndicatorCode::Fault, LedColor::Red, BlinkRate::Fast)]
    fn test_patterns(#[case] code: IndicatorCode, #[case] on: LedColor, #[case] blink: BlinkRate) {
        let pattern = code.pattern();
        assert_eq!(pattern.on, on);
        assert_eq!(pattern.off, LedColor::Off);
        assert_eq!(pattern.blink, blink);
    }

    #[test]
    fn test_recording_indicator() {
        let sink = RecordingIndicator::new();
        let shared = Arc::new(sink.clone());
        shared.set_indicator(IndicatorCode::Startup);
        shared.set_indicator(IndicatorCode::Idle);

        assert_eq!(sink.codes(), vec![IndicatorCode::Startup, IndicatorCode::Idle]);
        assert_eq!(sink.current(), Some(IndicatorCode::Idle));
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&IndicatorCode::AuthorizedPowerOff).unwrap();
        assert_eq!(json, "\"authorized_power_off\"");
    }
}
