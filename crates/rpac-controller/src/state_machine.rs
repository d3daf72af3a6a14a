//! Access control states and transition bookkeeping.
//!
//! # Valid Transitions
//!
//! - Idle → TokenPresentUnset → Authenticating → AuthorizedActive / AuthorizedPowerOff / Unauthorized
//! - AuthorizedActive ↔ AuthorizedPowerOff (power button)
//! - AuthorizedActive / AuthorizedPowerOff → Warning, or → Idle when the credential leaves with the relay off
//! - Unauthorized → Warning
//! - Warning → AuthorizedActive / AuthorizedPowerOff (resolved) or → Disconnecting
//! - Disconnecting → Idle, or → Faulted after a relay fault
//! - TokenPresentUnset → Idle (credential removed)
//! - Any state other than Disconnecting and Faulted → Disconnecting (relay fault)
//!
//! ```
//! use rpac_controller::{AccessState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! machine.transition_to(AccessState::TokenPresentUnset).unwrap();
//! assert!(machine.transition_to(AccessState::AuthorizedActive).is_err());
//! ```

use rpac_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Transitions kept for diagnostics.
const MAX_HISTORY_SIZE: usize = 100;

/// Access controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// No credential present.
    #[default]
    Idle,

    /// Credential present, token not read yet.
    TokenPresentUnset,

    /// Token read, waiting on the authenticator.
    Authenticating,

    /// Authorized and power button on; relay requested on.
    AuthorizedActive,

    /// Authorized, power button off; relay requested off.
    AuthorizedPowerOff,

    /// Authenticator said no.
    Unauthorized,

    /// Grace window running.
    Warning,

    /// Relay requested off, waiting for the credential to leave.
    Disconnecting,

    /// Relay fault latched; nothing more happens until restart.
    Faulted,
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            AccessState::Idle => "Idle",
            AccessState::TokenPresentUnset => "TokenPresentUnset",
            AccessState::Authenticating => "Authenticating",
            AccessState::AuthorizedActive => "AuthorizedActive",
            AccessState::AuthorizedPowerOff => "AuthorizedPowerOff",
            AccessState::Unauthorized => "Unauthorized",
            AccessState::Warning => "Warning",
            AccessState::Disconnecting => "Disconnecting",
            AccessState::Faulted => "Faulted",
        };
        write!(f, "{}", state_str)
    }
}

impl AccessState {
    /// Check if transition to `target` is valid from this state.
    ///
    /// ```
    /// use rpac_controller::AccessState;
    ///
    /// assert!(AccessState::Idle.can_transition_to(&AccessState::TokenPresentUnset));
    /// assert!(!AccessState::Idle.can_transition_to(&AccessState::AuthorizedActive));
    /// assert!(AccessState::AuthorizedActive.can_transition_to(&AccessState::Disconnecting));
    /// assert!(!AccessState::Faulted.can_transition_to(&AccessState::Idle));
    /// ```
    pub fn can_transition_to(&self, target: &AccessState) -> bool {
        use AccessState::*;

        if *target == Disconnecting {
            return !matches!(self, Disconnecting | Faulted);
        }

        matches!(
            (self, target),
            (Idle, TokenPresentUnset)
                | (TokenPresentUnset, Authenticating | Idle)
                | (
                    Authenticating,
                    AuthorizedActive | AuthorizedPowerOff | Unauthorized
                )
                | (AuthorizedActive, AuthorizedPowerOff | Warning | Idle)
                | (AuthorizedPowerOff, AuthorizedActive | Warning | Idle)
                | (Unauthorized, Warning)
                | (Warning, AuthorizedActive | AuthorizedPowerOff)
                | (Disconnecting, Idle | Faulted)
        )
    }

    /// Whether the session holds a positive authentication.
    pub fn is_authorized(&self) -> bool {
        matches!(
            self,
            AccessState::AuthorizedActive | AccessState::AuthorizedPowerOff
        )
    }
}

/// A single state transition with timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: AccessState,
    pub to: AccessState,
    pub at: Instant,
}

/// Validated state holder with a bounded transition history.
#[derive(Debug)]
pub struct StateMachine {
    current_state: AccessState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a machine in `Idle`.
    pub fn new() -> Self {
        Self {
            current_state: AccessState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> AccessState {
        self.current_state
    }

    /// Time spent in the current state as of `now`.
    pub fn time_in_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entered_at)
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Up to `count` most recent transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).copied().collect()
    }

    /// Move to `new_state` if the move is legal.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` and leaves the state unchanged
    /// when the move is not allowed.
    pub fn transition_to(&mut self, new_state: AccessState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
            at: Instant::now(),
        };

        self.current_state = new_state;
        self.state_entered_at = transition.at;
        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition);

        Ok(transition)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
