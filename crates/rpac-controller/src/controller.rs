//! Access control orchestrator.
//!
//! [`AccessController::tick`] is the only place session, warning, and state
//! are mutated. Each tick samples the debounced inputs and the relay state
//! once, then makes its decision from that snapshot. Token reads and
//! authentication calls run inside the tick and block it for at most their own
//! timeout; the relay sequencer and debounce tasks keep running meanwhile.
//!
//! The controller owns the one [`RfidReader`] and `tick` takes `&mut self`,
//! so the initial read, the periodic re-check, and the warning recovery read
//! can never overlap.

use crate::indicator::{IndicatorCode, IndicatorSink};
use crate::relay::{RelayCommand, RelayHandle};
use crate::session::EquipmentSession;
use crate::state_machine::{AccessState, StateMachine, StateTransition};
use crate::warning::{DisconnectTimer, WarningPoll, WarningReason, WarningState};
use rpac_core::{Authenticator, ButtonOffPolicy, ControllerConfig, Error, Token};
use rpac_hardware::{ByteSource, OutputPin, Signal, SignalReader};
use rpac_rfid::{ReadError, RfidReader};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything a tick decides on, sampled once.
#[derive(Debug, Clone, Copy)]
struct Inputs {
    presence: bool,
    button: bool,
    relay: RelayCommand,
}

/// The access control state machine with its collaborators.
pub struct AccessController<A, S, P, I> {
    config: ControllerConfig,
    authenticator: A,
    reader: RfidReader<S, P>,
    inputs: SignalReader,
    relay: RelayHandle,
    indicator: I,
    machine: StateMachine,
    session: EquipmentSession,
    warning: DisconnectTimer,
    last_indicator: Option<IndicatorCode>,
    state_tx: watch::Sender<AccessState>,
}

impl<A, S, P, I> AccessController<A, S, P, I>
where
    A: Authenticator,
    S: ByteSource,
    P: OutputPin,
    I: IndicatorSink,
{
    /// Wire up a controller and show the startup indicator.
    pub fn new(
        config: ControllerConfig,
        authenticator: A,
        reader: RfidReader<S, P>,
        inputs: SignalReader,
        relay: RelayHandle,
        indicator: I,
    ) -> Self {
        let reader = reader.with_poll_interval(config.read_poll_interval());
        let warning = DisconnectTimer::new(config.warning_window());
        let (state_tx, _) = watch::channel(AccessState::Idle);

        let mut controller = Self {
            config,
            authenticator,
            reader,
            inputs,
            relay,
            indicator,
            machine: StateMachine::new(),
            session: EquipmentSession::new(),
            warning,
            last_indicator: None,
            state_tx,
        };
        controller.show(IndicatorCode::Startup);
        info!(
            "Access controller ready for equipment {}",
            controller.config.equipment_id
        );
        controller
    }

    pub fn state(&self) -> AccessState {
        self.machine.current_state()
    }

    pub fn session(&self) -> &EquipmentSession {
        &self.session
    }

    pub fn warning(&self) -> WarningState {
        self.warning.state()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Relay intent handle shared with the sequencer.
    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    /// Recent state transitions.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.state_tx.subscribe()
    }

    /// Run one decision step.
    pub async fn tick(&mut self) {
        let inputs = Inputs {
            presence: self.inputs.read(Signal::Presence),
            button: self.inputs.read(Signal::PowerButton),
            relay: self.relay.snapshot(),
        };

        let state = self.state();
        let halted = matches!(state, AccessState::Disconnecting | AccessState::Faulted);
        if inputs.relay.faulted && !halted {
            self.relay_fault(inputs.relay);
        } else {
            match state {
                AccessState::Idle => self.on_idle(inputs).await,
                AccessState::TokenPresentUnset => self.on_token_present(inputs).await,
                AccessState::Authenticating => self.authenticate_session(inputs).await,
                AccessState::AuthorizedActive | AccessState::AuthorizedPowerOff => {
                    self.on_authorized(inputs).await
                }
                // Unauthorized hands over to a warning in the tick that enters it.
                AccessState::Unauthorized => self.begin_warning(WarningReason::Unauthorized),
                AccessState::Warning => self.on_warning(inputs).await,
                AccessState::Disconnecting => self.on_disconnecting(inputs),
                AccessState::Faulted => self.relay.request(false),
            }
        }

        self.refresh_indicator();
    }

    async fn on_idle(&mut self, inputs: Inputs) {
        if !inputs.presence {
            return;
        }

        info!("Credential inserted");
        self.enter(AccessState::TokenPresentUnset);
        self.on_token_present(inputs).await;
    }

    async fn on_token_present(&mut self, inputs: Inputs) {
        if !inputs.presence {
            info!("Credential removed before a token was read");
            self.session.reset();
            self.enter(AccessState::Idle);
            return;
        }

        let max_attempts = self.config.max_read_attempts;
        if self.session.reads_exhausted(max_attempts) {
            return;
        }

        match self.read_token(self.config.read_timeout()).await {
            Ok(token) => {
                self.session.set_token(token);
                self.enter(AccessState::Authenticating);
                self.authenticate_session(inputs).await;
            }
            Err(e) => {
                let attempts = self.session.record_failed_read();
                if e.is_aborted() {
                    debug!("Token read aborted (attempt {}/{})", attempts, max_attempts);
                } else {
                    warn!(
                        "Token read failed (attempt {}/{}): {}",
                        attempts, max_attempts, e
                    );
                }

                if self.session.reads_exhausted(max_attempts) {
                    error!(
                        "{}; remove the credential to retry",
                        Error::ReadMaxAttemptsExceeded { attempts }
                    );
                    self.refresh_indicator();
                }
            }
        }
    }

    async fn authenticate_session(&mut self, inputs: Inputs) {
        let authorized = match self.session.current_token().copied() {
            Some(token) => authenticate(&self.authenticator, &self.config, &token).await,
            None => false,
        };
        self.session
            .record_authentication(authorized, Instant::now());

        if authorized {
            self.relay.request(inputs.button);
            self.enter(authorized_state(inputs.button));
        } else {
            self.relay.request(false);
            self.enter(AccessState::Unauthorized);
            self.begin_warning(WarningReason::Unauthorized);
        }
    }

    async fn on_authorized(&mut self, inputs: Inputs) {
        let state = self.state();

        if !inputs.presence {
            if inputs.relay.actual_on || inputs.relay.requested_on {
                self.begin_warning(WarningReason::TokenRemoved);
            } else {
                info!("Credential removed with power off, session closed");
                self.session.reset();
                self.enter(AccessState::Idle);
            }
            return;
        }

        let target = authorized_state(inputs.button);
        if target != state {
            if state == AccessState::AuthorizedActive
                && self.config.button_off_policy == ButtonOffPolicy::Warn
            {
                self.relay.request(false);
                self.begin_warning(WarningReason::PowerButtonOff);
                return;
            }

            info!("Power button {}", if inputs.button { "on" } else { "off" });
            self.relay.request(inputs.button);
            self.enter(target);
        }

        if !self
            .session
            .reauth_due(Instant::now(), self.config.reauth_interval())
        {
            return;
        }

        let Some(expected) = self.session.current_token().copied() else {
            self.begin_warning(WarningReason::TokenMismatch);
            return;
        };

        debug!("Re-checking token");
        match self.read_token(self.config.read_timeout()).await {
            Ok(token) if token == expected => {
                self.session.confirm(Instant::now());
                debug!("Token re-confirmed");
            }
            Ok(token) => {
                warn!(
                    "Token changed from {} to {} while authorized",
                    expected.redacted(),
                    token.redacted()
                );
                self.begin_warning(WarningReason::TokenMismatch);
            }
            Err(ReadError::Aborted) => {
                self.begin_warning(WarningReason::TokenRemoved);
            }
            Err(e) => {
                warn!("Token re-check failed: {}", e);
                self.begin_warning(WarningReason::TokenMismatch);
            }
        }
    }

    async fn on_warning(&mut self, inputs: Inputs) {
        let now = Instant::now();
        let poll = self
            .warning
            .poll(now, inputs.presence, inputs.relay.actual_on);

        let remaining = match poll {
            WarningPoll::Pending { remaining } => remaining,
            WarningPoll::EarlyExit | WarningPoll::Expired | WarningPoll::Disconnecting => {
                self.begin_disconnect();
                return;
            }
            WarningPoll::Inactive => {
                warn!("Warning state without an active timer, disconnecting");
                self.warning.force_disconnect(WarningReason::Unauthorized);
                self.begin_disconnect();
                return;
            }
        };

        let resolved = match self.warning.reason() {
            Some(WarningReason::TokenMismatch | WarningReason::TokenRemoved) => {
                inputs.presence && self.recheck_token(remaining).await
            }
            Some(WarningReason::PowerButtonOff) => inputs.button,
            Some(WarningReason::Unauthorized) | None => false,
        };

        if resolved && self.warning.resolve() {
            self.session.confirm(Instant::now());
            self.relay.request(inputs.button);
            self.enter(authorized_state(inputs.button));
        }
    }

    /// Read once and compare against the session token.
    async fn recheck_token(&mut self, remaining: Duration) -> bool {
        let Some(expected) = self.session.current_token().copied() else {
            return false;
        };

        let timeout = self.config.read_timeout().min(remaining);
        match self.read_token(timeout).await {
            Ok(token) if token == expected => {
                info!("Matching token presented");
                true
            }
            Ok(token) => {
                warn!("Token {} does not match session token", token.redacted());
                false
            }
            Err(e) => {
                debug!("Recovery read failed: {}", e);
                false
            }
        }
    }

    fn on_disconnecting(&mut self, inputs: Inputs) {
        self.relay.request(false);

        let relay_released = !inputs.relay.actual_on || inputs.relay.faulted;
        if inputs.presence || !relay_released {
            return;
        }

        self.session.reset();
        self.warning.finish();

        if inputs.relay.faulted {
            error!("Relay fault latched, access control halted until restart");
            self.enter(AccessState::Faulted);
        } else {
            info!("Disconnect complete, session reset");
            self.enter(AccessState::Idle);
        }
    }

    fn begin_warning(&mut self, reason: WarningReason) {
        self.warning.trigger(reason, Instant::now());
        if self.state() != AccessState::Warning {
            self.enter(AccessState::Warning);
        }
    }

    fn begin_disconnect(&mut self) {
        self.relay.request(false);
        self.session.revoke();
        self.enter(AccessState::Disconnecting);
    }

    fn relay_fault(&mut self, relay: RelayCommand) {
        let fault = Error::RelayFault {
            requested: relay.requested_on,
            attempts: relay.fault_count,
        };
        error!("{}; forcing disconnect", fault);

        self.relay.request(false);
        self.session.revoke();
        self.warning.force_disconnect(WarningReason::Unauthorized);
        self.enter(AccessState::Disconnecting);
    }

    async fn read_token(&mut self, timeout: Duration) -> Result<Token, ReadError> {
        let inputs = self.inputs.clone();
        self.reader
            .read_token(timeout, move || !inputs.read(Signal::Presence))
            .await
    }

    fn enter(&mut self, to: AccessState) {
        let held = self.machine.time_in_state(Instant::now());
        match self.machine.transition_to(to) {
            Ok(transition) => {
                info!(
                    "State {} -> {} (after {:?})",
                    transition.from, transition.to, held
                );
                self.state_tx.send_replace(to);
                self.refresh_indicator();
            }
            Err(e) => error!("{}", e),
        }
    }

    fn indicator_for_state(&self) -> IndicatorCode {
        match self.state() {
            AccessState::Idle => IndicatorCode::Idle,
            AccessState::TokenPresentUnset => {
                if self
                    .session
                    .reads_exhausted(self.config.max_read_attempts)
                {
                    IndicatorCode::Fault
                } else {
                    IndicatorCode::ReadingToken
                }
            }
            AccessState::Authenticating => IndicatorCode::Authenticating,
            AccessState::AuthorizedActive => IndicatorCode::AuthorizedOn,
            AccessState::AuthorizedPowerOff => IndicatorCode::AuthorizedPowerOff,
            AccessState::Unauthorized => IndicatorCode::Unauthorized,
            AccessState::Warning => IndicatorCode::Warning,
            AccessState::Disconnecting => {
                if self.relay.is_faulted() {
                    IndicatorCode::Fault
                } else {
                    IndicatorCode::Unauthorized
                }
            }
            AccessState::Faulted => IndicatorCode::Fault,
        }
    }

    fn refresh_indicator(&mut self) {
        let code = self.indicator_for_state();
        self.show(code);
    }

    fn show(&mut self, code: IndicatorCode) {
        if self.last_indicator != Some(code) {
            debug!("Indicator {}", code);
            self.indicator.set_indicator(code);
            self.last_indicator = Some(code);
        }
    }
}

fn authorized_state(button: bool) -> AccessState {
    if button {
        AccessState::AuthorizedActive
    } else {
        AccessState::AuthorizedPowerOff
    }
}

/// Ask the authenticator, folding every failure into a denial.
async fn authenticate<A: Authenticator>(
    authenticator: &A,
    config: &ControllerConfig,
    token: &Token,
) -> bool {
    let equipment = config.equipment_id;
    let timeout = config.auth_timeout();
    let call = authenticator.authenticate(equipment, token);

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(true)) => {
            info!(
                "Token {} authorized on equipment {}",
                token.redacted(),
                equipment
            );
            true
        }
        Ok(Ok(false)) => {
            let denied = Error::AuthDenied {
                equipment: equipment.as_u32(),
                token: token.redacted().to_string(),
            };
            warn!("{}", denied);
            false
        }
        Ok(Err(e)) if e.is_auth_failure() => {
            error!("Authentication service failed, treating as denied: {}", e);
            false
        }
        Ok(Err(e)) => {
            error!("Unexpected authentication error, treating as denied: {}", e);
            false
        }
        Err(_) => {
            let e = Error::AuthService(format!("no answer within {:?}", timeout));
            error!("Authentication failed, treating as denied: {}", e);
            false
        }
    }
}
