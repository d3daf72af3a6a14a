//! Per-credential session state.

use rpac_core::Token;
use std::time::Duration;
use tokio::time::Instant;

/// Authentication lifecycle for the currently inserted credential.
///
/// Populated stepwise: token set, then authenticated, then authorized.
/// Owned by the access controller and reset whenever the credential is gone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentSession {
    current_token: Option<Token>,
    authenticated: bool,
    authorized: bool,
    last_authenticated_at: Option<Instant>,
    read_attempts: u32,
}

impl EquipmentSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Token read for this session, if any.
    pub fn current_token(&self) -> Option<&Token> {
        self.current_token.as_ref()
    }

    /// Whether a token has been read.
    pub fn token_set(&self) -> bool {
        self.current_token.is_some()
    }

    /// Whether the authentication service answered.
    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the answer was yes.
    pub fn authorized(&self) -> bool {
        self.authorized
    }

    /// When the token was last confirmed.
    pub fn last_authenticated_at(&self) -> Option<Instant> {
        self.last_authenticated_at
    }

    /// Failed reads so far.
    pub fn read_attempts(&self) -> u32 {
        self.read_attempts
    }

    /// Store the token from a completed read.
    pub fn set_token(&mut self, token: Token) {
        self.current_token = Some(token);
        self.authenticated = false;
        self.authorized = false;
        self.read_attempts = 0;
    }

    /// Count one failed read; returns the new total.
    pub fn record_failed_read(&mut self) -> u32 {
        self.read_attempts += 1;
        self.read_attempts
    }

    /// Whether the read ceiling has been reached.
    pub fn reads_exhausted(&self, max_attempts: u32) -> bool {
        self.read_attempts >= max_attempts
    }

    /// Record an authentication decision made at `now`.
    ///
    /// Service errors must be recorded as `authorized = false`.
    pub fn record_authentication(&mut self, authorized: bool, now: Instant) {
        self.authenticated = true;
        self.authorized = authorized;
        self.last_authenticated_at = Some(now);
    }

    /// Mark the stored token as re-confirmed at `now`.
    pub fn confirm(&mut self, now: Instant) {
        self.last_authenticated_at = Some(now);
    }

    /// Drop authorization without clearing the token.
    pub fn revoke(&mut self) {
        self.authorized = false;
    }

    /// Whether the token is due for re-confirmation at `now`.
    ///
    /// Due at exactly `last_authenticated_at + interval`, never earlier.
    pub fn reauth_due(&self, now: Instant, interval: Duration) -> bool {
        self.authorized
            && self
                .last_authenticated_at
                .is_some_and(|at| now >= at + interval)
    }
}
