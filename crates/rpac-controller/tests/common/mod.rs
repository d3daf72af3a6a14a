#![allow(dead_code)]

use rpac_controller::{AccessController, RecordingIndicator, RelaySequencer};
use rpac_core::constants::{END_BYTE, START_BYTE};
use rpac_core::{Authenticator, ControllerConfig, EquipmentId, Error, Result, Token};
use rpac_hardware::mock::{
    MockInputPin, MockInputPinHandle, MockOutputPin, MockOutputPinHandle, MockSerial,
    MockSerialHandle,
};
use rpac_hardware::{InputMonitor, MonitorHandle, Signal};
use rpac_rfid::RfidReader;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

pub const TOKEN: &[u8; 10] = b"ABCD123456";
pub const OTHER_TOKEN: &[u8; 10] = b"ZZZZ999999";

/// Long enough for any input change to commit.
pub const SETTLE: Duration = Duration::from_millis(250);

pub type Controller =
    AccessController<MockAuthenticator, MockSerial, MockOutputPin, RecordingIndicator>;

/// Wrap `payload` in STX/ETX.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 2);
    bytes.push(START_BYTE);
    bytes.extend_from_slice(payload);
    bytes.push(END_BYTE);
    bytes
}

/// Allow-list authenticator that can be switched into failure.
#[derive(Debug, Clone, Default)]
pub struct MockAuthenticator {
    allowed: Arc<Mutex<HashSet<String>>>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockAuthenticator {
    pub fn allow(&self, token: &[u8]) {
        let token = String::from_utf8(token.to_vec()).unwrap();
        self.allowed.lock().unwrap().insert(token);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Authenticator for MockAuthenticator {
    async fn authenticate(&self, _equipment: EquipmentId, token: &Token) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::AuthService("connection refused".to_string()));
        }
        Ok(self.allowed.lock().unwrap().contains(token.as_str()))
    }
}

/// Test-side handles for every line the controller touches.
pub struct Lines {
    pub presence: MockInputPinHandle,
    pub button: MockInputPinHandle,
    pub serial: MockSerialHandle,
    pub reader_power: MockOutputPinHandle,
    pub relay: MockOutputPinHandle,
    pub indicator: RecordingIndicator,
    pub auth: MockAuthenticator,
    pub monitor: MonitorHandle,
}

impl Lines {
    /// Put the credential in: the reader starts seeing `payload`.
    pub fn insert(&self, payload: &[u8]) {
        self.serial.present(frame(payload));
        self.presence.set_level(true);
    }

    pub fn remove(&self) {
        self.serial.remove();
        self.presence.set_level(false);
    }
}

/// Build an unstarted controller and sequencer. Must run inside a runtime.
pub fn build(
    config: ControllerConfig,
    button_on: bool,
) -> (Controller, RelaySequencer<MockOutputPin>, Lines) {
    let mut monitor = InputMonitor::new(config.debounce());
    let (presence_pin, presence) = MockInputPin::new(false);
    let (button_pin, button) = MockInputPin::new(button_on);
    presence.connect(monitor.register(Signal::Presence, presence_pin));
    button.connect(monitor.register(Signal::PowerButton, button_pin));
    let monitor = monitor.start().unwrap();

    let (serial_port, serial) = MockSerial::new();
    let (power_pin, reader_power) = MockOutputPin::new();
    let (relay_pin, relay) = MockOutputPin::new();
    let (sequencer, relay_handle) = RelaySequencer::new(relay_pin, &config);

    let indicator = RecordingIndicator::new();
    let auth = MockAuthenticator::default();
    auth.allow(TOKEN);

    let controller = AccessController::new(
        config,
        auth.clone(),
        RfidReader::new(serial_port, power_pin),
        monitor.reader(),
        relay_handle,
        indicator.clone(),
    );

    let lines = Lines {
        presence,
        button,
        serial,
        reader_power,
        relay,
        indicator,
        auth,
        monitor,
    };
    (controller, sequencer, lines)
}

/// Controller driven tick by tick from the test, relay sequencer running.
pub struct Rig {
    pub controller: Controller,
    pub lines: Lines,
    sequencer: CancellationToken,
}

impl Rig {
    pub fn new(config: ControllerConfig) -> Self {
        let (controller, sequencer, lines) = build(config, true);
        let cancel = CancellationToken::new();
        tokio::spawn(sequencer.run(cancel.clone()));
        Self {
            controller,
            lines,
            sequencer: cancel,
        }
    }

    /// Tick at the configured rate for `duration`.
    pub async fn run_for(&mut self, duration: Duration) {
        let tick = self.controller.config().tick_interval();
        let end = Instant::now() + duration;
        while Instant::now() < end {
            self.controller.tick().await;
            sleep(tick).await;
        }
    }

    /// Insert the allowed credential and tick until authorized, relay settled.
    pub async fn authorize(&mut self) {
        self.lines.insert(TOKEN);
        sleep(SETTLE).await;
        self.controller.tick().await;
        sleep(Duration::from_millis(1100)).await;
    }

    pub fn relay_requested(&self) -> bool {
        self.controller.relay().snapshot().requested_on
    }

    pub fn relay_on(&self) -> bool {
        self.controller.relay().snapshot().actual_on
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        self.sequencer.cancel();
    }
}
