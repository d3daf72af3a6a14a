//! Disconnect/warning timer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Why a disconnect sequence started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    /// Re-check read a different token, or none.
    TokenMismatch,
    /// Credential pulled while the relay was on.
    TokenRemoved,
    /// Authentication said no.
    Unauthorized,
    /// Power button switched off under the warn policy.
    PowerButtonOff,
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TokenMismatch => "token mismatch",
            Self::TokenRemoved => "token removed",
            Self::Unauthorized => "unauthorized",
            Self::PowerButtonOff => "power button off",
        };
        write!(f, "{}", name)
    }
}

/// At most one sequence is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarningState {
    #[default]
    None,
    Warning {
        reason: WarningReason,
        deadline: Instant,
    },
    Disconnecting {
        reason: WarningReason,
    },
}

/// Result of a [`DisconnectTimer::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningPoll {
    /// No sequence running.
    Inactive,
    /// Still inside the grace window.
    Pending { remaining: Duration },
    /// Nothing left to protect; moved to disconnecting ahead of the deadline.
    EarlyExit,
    /// Deadline reached this poll; moved to disconnecting.
    Expired,
    /// Already disconnecting.
    Disconnecting,
}

/// Owns the [`WarningState`] and its deadline.
#[derive(Debug, Clone)]
pub struct DisconnectTimer {
    window: Duration,
    state: WarningState,
}

impl DisconnectTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: WarningState::None,
        }
    }

    pub fn state(&self) -> WarningState {
        self.state
    }

    /// Grace window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a warning or disconnect is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, WarningState::None)
    }

    /// Reason of the running sequence.
    pub fn reason(&self) -> Option<WarningReason> {
        match self.state {
            WarningState::None => None,
            WarningState::Warning { reason, .. } | WarningState::Disconnecting { reason } => {
                Some(reason)
            }
        }
    }

    /// Start a warning for `reason` with its deadline one window from `now`.
    ///
    /// Returns `false` and changes nothing if a sequence is already active.
    pub fn trigger(&mut self, reason: WarningReason, now: Instant) -> bool {
        if self.is_active() {
            return false;
        }

        let deadline = now + self.window;
        warn!(
            "Disconnect warning started ({}), power cut in {:?}",
            reason, self.window
        );
        self.state = WarningState::Warning { reason, deadline };
        true
    }

    /// Advance the sequence.
    ///
    /// With the credential confirmed absent and the relay already off there is
    /// nothing to protect, so the warning ends early regardless of reason.
    pub fn poll(&mut self, now: Instant, presence: bool, relay_on: bool) -> WarningPoll {
        match self.state {
            WarningState::None => WarningPoll::Inactive,
            WarningState::Disconnecting { .. } => WarningPoll::Disconnecting,
            WarningState::Warning { reason, deadline } => {
                if !presence && !relay_on {
                    info!("Warning ({}) ended early: credential gone, relay off", reason);
                    self.state = WarningState::Disconnecting { reason };
                    return WarningPoll::EarlyExit;
                }
                if now >= deadline {
                    warn!("Warning ({}) expired, disconnecting", reason);
                    self.state = WarningState::Disconnecting { reason };
                    return WarningPoll::Expired;
                }
                WarningPoll::Pending {
                    remaining: deadline - now,
                }
            }
        }
    }

    /// Cancel a running warning. Has no effect once disconnecting.
    pub fn resolve(&mut self) -> bool {
        match self.state {
            WarningState::Warning { reason, .. } => {
                info!("Warning ({}) resolved", reason);
                self.state = WarningState::None;
                true
            }
            _ => false,
        }
    }

    /// Skip the grace window.
    pub fn force_disconnect(&mut self, reason: WarningReason) {
        if !matches!(self.state, WarningState::Disconnecting { .. }) {
            warn!("Forced disconnect ({})", reason);
            self.state = WarningState::Disconnecting { reason };
        }
    }

    /// Clear a completed disconnect.
    pub fn finish(&mut self) {
        self.state = WarningState::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    #[test]
    fn test_trigger_sets_deadline() {
        let mut timer = DisconnectTimer::new(WINDOW);
        let now = Instant::now();
        assert!(timer.trigger(WarningReason::TokenRemoved, now));
        assert_eq!(
            timer.state(),
            WarningState::Warning {
                reason: WarningReason::TokenRemoved,
                deadline: now + WINDOW,
            }
        );
    }

    #[test]
    fn test_retrigger_is_ignored() {
        let mut timer = DisconnectTimer::new(WINDOW);
        let t0 = Instant::now();
        timer.trigger(WarningReason::TokenRemoved, t0);

        assert!(!timer.trigger(WarningReason::TokenMismatch, t0 + Duration::from_secs(10)));
        assert_eq!(timer.reason(), Some(WarningReason::TokenRemoved));
        assert_eq!(
            timer.poll(t0 + Duration::from_secs(10), true, true),
            WarningPoll::Pending {
                remaining: Duration::from_secs(20)
            }
        );
    }

    #[test]
    fn test_expires_exactly_at_deadline() {
        let mut timer = DisconnectTimer::new(WINDOW);
        let t0 = Instant::now();
        timer.trigger(WarningReason::TokenMismatch, t0);

        let just_before = t0 + WINDOW - Duration::from_millis(1);
        assert!(matches!(
            timer.poll(just_before, true, true),
            WarningPoll::Pending { .. }
        ));
        assert_eq!(timer.poll(t0 + WINDOW, true, true), WarningPoll::Expired);
        assert_eq!(timer.poll(t0 + WINDOW, true, true), WarningPoll::Disconnecting);
    }

    #[test]
    fn test_early_exit_when_nothing_to_protect() {
        let mut timer = DisconnectTimer::new(WINDOW);
        let t0 = Instant::now();
        timer.trigger(WarningReason::Unauthorized, t0);

        // Credential still in: keep warning.
        assert!(matches!(
            timer.poll(t0, true, false),
            WarningPoll::Pending { .. }
        ));
        assert_eq!(timer.poll(t0, false, false), WarningPoll::EarlyExit);
        assert_eq!(
            timer.state(),
            WarningState::Disconnecting {
                reason: WarningReason::Unauthorized
            }
        );
    }

    #[test]
    fn test_resolve_only_while_warning() {
        let mut timer = DisconnectTimer::new(WINDOW);
        assert!(!timer.resolve());

        let t0 = Instant::now();
        timer.trigger(WarningReason::TokenRemoved, t0);
        assert!(timer.resolve());
        assert!(!timer.is_active());

        timer.trigger(WarningReason::TokenRemoved, t0);
        timer.poll(t0 + WINDOW, true, true);
        assert!(!timer.resolve());
        assert!(timer.is_active());

        timer.finish();
        assert_eq!(timer.state(), WarningState::None);
    }

    #[test]
    fn test_force_disconnect() {
        let mut timer = DisconnectTimer::new(WINDOW);
        timer.force_disconnect(WarningReason::Unauthorized);
        assert_eq!(timer.poll(Instant::now(), true, true), WarningPoll::Disconnecting);
        assert!(!timer.trigger(WarningReason::TokenRemoved, Instant::now()));
    }
}
