//! Debounced input monitor.
//!
//! This module provides the `InputMonitor`, which turns raw edge
//! notifications on the presence and power-button lines into stable boolean
//! signals that the access controller polls.
//!
//! # Architecture
//!
//! Each registered input runs in its own async task. Edge callbacks only push
//! a wake-up onto that task's channel; they never touch signal state. The
//! task samples the pin, restarts the debounce window, and commits once the
//! window passes quietly.
//!
//! ```text
//! ┌──────────┐ notify() ┌────────────────┐  lock   ┌─────────────────┐
//! │ Edge ISR │─────────►│ Debounce task  │────────►│ DebouncedSignal │
//! └──────────┘          │ (per signal)   │         └────────┬────────┘
//!                       └────────────────┘                  │ read()
//!                                                           ▼
//!                                                    Access controller
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use rpac_hardware::monitor::InputMonitor;
//! use rpac_hardware::mock::MockInputPin;
//! use rpac_hardware::Signal;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> rpac_hardware::Result<()> {
//!     let mut monitor = InputMonitor::new(Duration::from_millis(200));
//!
//!     let (presence, presence_line) = MockInputPin::new(false);
//!     presence_line.connect(monitor.register(Signal::Presence, presence));
//!
//!     let handle = monitor.start()?;
//!     presence_line.set_level(true);
//!     tokio::time::sleep(Duration::from_millis(250)).await;
//!     assert!(handle.read(Signal::Presence));
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::debounce::{DebouncedSignal, EdgeOutcome};
use crate::traits::InputPin;
use crate::types::Signal;
use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Edge callback for one input line.
///
/// Cheap to clone and never blocks, so it is safe to call from an interrupt
/// handler context.
#[derive(Debug, Clone)]
pub struct EdgeNotifier {
    signal: Signal,
    tx: mpsc::UnboundedSender<()>,
}

impl EdgeNotifier {
    /// Report that the line changed level.
    pub fn notify(&self) {
        // A closed channel means the monitor shut down; the edge is moot.
        let _ = self.tx.send(());
    }

    /// Signal this notifier reports for.
    pub fn signal(&self) -> Signal {
        self.signal
    }
}

struct MonitoredInput {
    pin: Box<dyn InputPin>,
    edges: mpsc::UnboundedReceiver<()>,
}

/// Read-only view of committed signal values.
#[derive(Debug, Clone, Default)]
pub struct SignalReader {
    signals: Arc<HashMap<Signal, Arc<Mutex<DebouncedSignal>>>>,
}

impl SignalReader {
    /// Last committed value of `signal`.
    ///
    /// Unregistered signals read as `false`.
    pub fn read(&self, signal: Signal) -> bool {
        self.signals
            .get(&signal)
            .is_some_and(|state| state.lock().stable())
    }
}

/// Handle for a running monitor.
pub struct MonitorHandle {
    reader: SignalReader,
    tasks: JoinSet<Result<()>>,
}

impl MonitorHandle {
    /// Last committed value of `signal`.
    pub fn read(&self, signal: Signal) -> bool {
        self.reader.read(signal)
    }

    /// Cloneable reader for other tasks.
    pub fn reader(&self) -> SignalReader {
        self.reader.clone()
    }

    /// Stop all debounce tasks.
    ///
    /// Task errors are logged, not returned.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tasks.abort_all();

        let mut failures = 0;
        while let Some(result) = self.tasks.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Debounce task ended with error: {}", e);
                    failures += 1;
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    warn!("Debounce task panicked: {}", e);
                    failures += 1;
                }
            }
        }

        debug!("Input monitor stopped ({} task failures)", failures);
        Ok(())
    }
}

/// Collects input lines and spawns one debounce task per line.
pub struct InputMonitor {
    window: Duration,
    inputs: HashMap<Signal, MonitoredInput>,
}

impl InputMonitor {
    /// Create a monitor with a fixed debounce `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            inputs: HashMap::new(),
        }
    }

    /// Register `pin` as the source of `signal`.
    ///
    /// Returns the notifier the platform's edge interrupt must call.
    /// Registering the same signal twice replaces the earlier pin.
    pub fn register(&mut self, signal: Signal, pin: impl InputPin + 'static) -> EdgeNotifier {
        let (tx, edges) = mpsc::unbounded_channel();
        self.inputs.insert(
            signal,
            MonitoredInput {
                pin: Box::new(pin),
                edges,
            },
        );
        EdgeNotifier { signal, tx }
    }

    /// Sample every line once and start the debounce tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if an initial pin read fails.
    pub fn start(self) -> Result<MonitorHandle> {
        let now = Instant::now();
        let mut tasks = JoinSet::new();
        let mut signals = HashMap::new();

        for (signal, input) in self.inputs {
            let initial = input.pin.read()?;
            let state = Arc::new(Mutex::new(DebouncedSignal::new(initial, self.window, now)));
            info!("Monitoring {} (initial level {})", signal, initial);

            signals.insert(signal, Arc::clone(&state));
            tasks.spawn(debounce_task(signal, input, state));
        }

        Ok(MonitorHandle {
            reader: SignalReader {
                signals: Arc::new(signals),
            },
            tasks,
        })
    }
}

/// Re-sample delay after a failed pin read.
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

async fn debounce_task(
    signal: Signal,
    mut input: MonitoredInput,
    state: Arc<Mutex<DebouncedSignal>>,
) -> Result<()> {
    let mut edges_open = true;
    let mut retry_at: Option<Instant> = None;
    let mut failures = 0u32;

    loop {
        let deadline = state.lock().commit_deadline();
        if !edges_open && deadline.is_none() && retry_at.is_none() {
            break;
        }

        tokio::select! {
            edge = input.edges.recv(), if edges_open => {
                if edge.is_none() {
                    edges_open = false;
                    continue;
                }
                retry_at = sample(signal, &input, &state, &mut failures);
            }
            _ = sleep_until_opt(retry_at) => {
                retry_at = sample(signal, &input, &state, &mut failures);
            }
            _ = sleep_until_opt(deadline) => {
                if let Some(stable) = state.lock().commit(Instant::now()) {
                    info!("{} stable at {}", signal, stable);
                }
            }
        }
    }

    Ok(())
}

/// Feed the current pin level into the debouncer.
///
/// A failed read leaves the signal untouched and returns when to try again.
fn sample(
    signal: Signal,
    input: &MonitoredInput,
    state: &Mutex<DebouncedSignal>,
    failures: &mut u32,
) -> Option<Instant> {
    let now = Instant::now();
    match input.pin.read() {
        Ok(level) => {
            if *failures > 0 {
                info!("{} readable again after {} failed reads", signal, failures);
                *failures = 0;
            }
            let outcome = state.lock().on_raw(level, now);
            if outcome == EdgeOutcome::WindowRestarted {
                debug!("{} still bouncing, debounce window restarted", signal);
            }
            None
        }
        Err(e) => {
            *failures += 1;
            if *failures == 1 {
                warn!("{} read failed, holding last stable level: {}", signal, e);
            } else {
                debug!("{} read failed ({} in a row): {}", signal, failures, e);
            }
            Some(now + READ_RETRY_DELAY)
        }
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockInputPin;

    #[tokio::test]
    async fn test_unregistered_signal_reads_false() {
        let monitor = InputMonitor::new(Duration::from_millis(200));
        let handle = monitor.start().unwrap();
        assert!(!handle.read(Signal::PowerButton));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_initial_level_is_stable() {
        let mut monitor = InputMonitor::new(Duration::from_millis(200));
        let (pin, _line) = MockInputPin::new(true);
        monitor.register(Signal::PowerButton, pin);

        let handle = monitor.start().unwrap();
        assert!(handle.read(Signal::PowerButton));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_initial_read_failure() {
        let mut monitor = InputMonitor::new(Duration::from_millis(200));
        let (pin, line) = MockInputPin::new(false);
        line.set_failing(true);
        monitor.register(Signal::Presence, pin);

        assert!(monitor.start().is_err());
    }

    #[test]
    fn test_notifier_reports_signal() {
        let mut monitor = InputMonitor::new(Duration::from_millis(200));
        let (pin, _line) = MockInputPin::new(false);
        let notifier = monitor.register(Signal::Presence, pin);
        assert_eq!(notifier.signal(), Signal::Presence);
    }
}
