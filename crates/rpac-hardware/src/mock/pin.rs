//! Mock digital pins for testing and development.
//!
//! Each mock returns a `(pin, handle)` pair. The pin goes to the code under
//! test; the handle stays with the test to change levels, inject faults, and
//! inspect writes.

use crate::monitor::EdgeNotifier;
use crate::traits::{InputPin, OutputPin};
use crate::{HardwareError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct InputState {
    level: bool,
    notifier: Option<EdgeNotifier>,
    failing: bool,
}

/// Mock digital input.
///
/// # Examples
///
/// ```
/// use rpac_hardware::mock::MockInputPin;
/// use rpac_hardware::traits::InputPin;
///
/// let (pin, handle) = MockInputPin::new(false);
/// handle.set_level(true);
/// assert!(pin.read().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct MockInputPin {
    state: Arc<Mutex<InputState>>,
}

impl MockInputPin {
    /// Create a mock input starting at `level`.
    pub fn new(level: bool) -> (Self, MockInputPinHandle) {
        let state = Arc::new(Mutex::new(InputState {
            level,
            ..InputState::default()
        }));

        (
            Self {
                state: Arc::clone(&state),
            },
            MockInputPinHandle { state },
        )
    }
}

impl InputPin for MockInputPin {
    fn read(&self) -> Result<bool> {
        let state = self.state.lock();
        if state.failing {
            return Err(HardwareError::communication("mock input read failed"));
        }
        Ok(state.level)
    }
}

/// Handle for driving a [`MockInputPin`].
#[derive(Debug, Clone)]
pub struct MockInputPinHandle {
    state: Arc<Mutex<InputState>>,
}

impl MockInputPinHandle {
    /// Attach the edge callback fired by every level change.
    ///
    /// This stands in for registering an interrupt handler on a GPIO line.
    pub fn connect(&self, notifier: EdgeNotifier) {
        self.state.lock().notifier = Some(notifier);
    }

    /// Set the line level and fire an edge if it changed.
    pub fn set_level(&self, level: bool) {
        let notifier = {
            let mut state = self.state.lock();
            if state.level == level {
                return;
            }
            state.level = level;
            state.notifier.clone()
        };

        if let Some(notifier) = notifier {
            notifier.notify();
        }
    }

    /// Fire an edge without changing the level (electrical noise).
    pub fn glitch(&self) {
        let notifier = self.state.lock().notifier.clone();
        if let Some(notifier) = notifier {
            notifier.notify();
        }
    }

    /// Make subsequent reads fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Current raw level.
    pub fn level(&self) -> bool {
        self.state.lock().level
    }
}

#[derive(Debug, Default)]
struct OutputState {
    level: bool,
    writes: usize,
    stuck: Option<bool>,
    failing: bool,
}

/// Mock digital output with read-back.
///
/// Writes are counted so tests can assert that an idempotent request causes
/// no hardware traffic. A stuck output ignores writes and reads back a fixed
/// level, which is how relay faults are simulated.
///
/// # Examples
///
/// ```
/// use rpac_hardware::mock::MockOutputPin;
/// use rpac_hardware::traits::OutputPin;
///
/// let (relay, handle) = MockOutputPin::new();
/// relay.write(true).unwrap();
/// assert!(relay.read().unwrap());
/// assert_eq!(handle.write_count(), 1);
///
/// handle.set_stuck(Some(false));
/// relay.write(true).unwrap();
/// assert!(!relay.read().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct MockOutputPin {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputPin {
    /// Create a mock output starting low.
    pub fn new() -> (Self, MockOutputPinHandle) {
        let state = Arc::new(Mutex::new(OutputState::default()));

        (
            Self {
                state: Arc::clone(&state),
            },
            MockOutputPinHandle { state },
        )
    }
}

impl OutputPin for MockOutputPin {
    fn write(&self, level: bool) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(HardwareError::communication("mock output write failed"));
        }
        state.writes += 1;
        if state.stuck.is_none() {
            state.level = level;
        }
        Ok(())
    }

    fn read(&self) -> Result<bool> {
        let state = self.state.lock();
        Ok(state.stuck.unwrap_or(state.level))
    }
}

/// Handle for inspecting and sabotaging a [`MockOutputPin`].
#[derive(Debug, Clone)]
pub struct MockOutputPinHandle {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputPinHandle {
    /// Observed level, including any stuck override.
    pub fn level(&self) -> bool {
        let state = self.state.lock();
        state.stuck.unwrap_or(state.level)
    }

    /// Number of accepted writes so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Pin the observed level regardless of writes; `None` releases it.
    pub fn set_stuck(&self, level: Option<bool>) {
        self.state.lock().stuck = level;
    }

    /// Make subsequent writes fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}
