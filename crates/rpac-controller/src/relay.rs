//! Relay sequencer.
//!
//! The access controller only states intent (`requested_on`). The sequencer
//! owns the hardware: it writes the relay output, re-checks it after a settle
//! delay, retries a bounded number of times, and latches a fault if the relay
//! never follows. It never reports power as changed unless the output reads
//! back that way.
//!
//! ```text
//!               requested != observed
//!  Settled ─────────────────────────────► Pending (write, wait settle)
//!     ▲                                     │
//!     │ observed == requested               │ mismatch, fault_count < max
//!     ├─────────────────────────────────────┤──────► write again
//!     │                                     │
//!     │                                     │ mismatch, fault_count == max
//!     │                                     ▼
//!     └──── new distinct request ◄───── Stalled (fault flag stays latched)
//! ```

use parking_lot::Mutex;
use rpac_core::ControllerConfig;
use rpac_hardware::OutputPin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shared relay intent and observed state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayCommand {
    /// What the access controller wants.
    pub requested_on: bool,
    /// What the output last read back as.
    pub actual_on: bool,
    /// A write is waiting for its settle check.
    pub pending: bool,
    /// Failed settle checks in the current cycle.
    pub fault_count: u32,
    /// Latched once a cycle exhausted its attempts.
    pub faulted: bool,
}

/// Access controller's side of the relay: write intent, read state.
#[derive(Debug, Clone, Default)]
pub struct RelayHandle {
    command: Arc<Mutex<RelayCommand>>,
}

impl RelayHandle {
    /// Request the relay on or off.
    pub fn request(&self, on: bool) {
        let mut command = self.command.lock();
        if command.requested_on != on {
            debug!("Relay requested {}", if on { "ON" } else { "OFF" });
            command.requested_on = on;
        }
    }

    /// Copy of the current command.
    pub fn snapshot(&self) -> RelayCommand {
        *self.command.lock()
    }

    /// Whether a relay fault is latched.
    pub fn is_faulted(&self) -> bool {
        self.command.lock().faulted
    }
}

/// Drives the relay output toward the requested state.
pub struct RelaySequencer<P> {
    pin: P,
    command: Arc<Mutex<RelayCommand>>,
    settle_delay: Duration,
    max_attempts: u32,
    poll_interval: Duration,
    /// Level being driven in the current cycle.
    target: Option<bool>,
    /// Settle check time for the last write.
    check_at: Option<Instant>,
    /// Request that exhausted its attempts.
    stalled: Option<bool>,
}

impl<P: OutputPin> RelaySequencer<P> {
    /// Create a sequencer for `pin` and the handle the controller writes to.
    pub fn new(pin: P, config: &ControllerConfig) -> (Self, RelayHandle) {
        let handle = RelayHandle::default();
        let sequencer = Self {
            pin,
            command: Arc::clone(&handle.command),
            settle_delay: config.relay_settle_delay(),
            max_attempts: config.relay_max_attempts,
            poll_interval: config.relay_poll_interval(),
            target: None,
            check_at: None,
            stalled: None,
        };
        (sequencer, handle)
    }

    /// Run one sequencing pass at `now`.
    pub fn step(&mut self, now: Instant) {
        let requested = self.command.lock().requested_on;
        let observed = match self.pin.read() {
            Ok(level) => Some(level),
            Err(e) => {
                warn!("Relay read-back failed: {}", e);
                None
            }
        };

        if let Some(level) = observed {
            self.command.lock().actual_on = level;
        }

        if self.target == Some(requested)
            && let Some(check_at) = self.check_at
        {
            if now >= check_at {
                self.check_at = None;
                self.settle_check(requested, observed, now);
            }
            return;
        }

        // New request, or nothing in flight.
        self.target = None;
        self.check_at = None;

        if observed == Some(requested) {
            self.settled(requested);
            return;
        }
        if self.stalled == Some(requested) {
            return;
        }

        self.stalled = None;
        self.target = Some(requested);
        {
            let mut command = self.command.lock();
            command.fault_count = 0;
            command.pending = true;
        }
        self.write(requested, now);
    }

    fn settle_check(&mut self, requested: bool, observed: Option<bool>, now: Instant) {
        if observed == Some(requested) {
            info!("Relay settled {}", if requested { "ON" } else { "OFF" });
            self.settled(requested);
            return;
        }

        let fault_count = {
            let mut command = self.command.lock();
            command.fault_count += 1;
            command.fault_count
        };

        if fault_count >= self.max_attempts {
            error!(
                "Relay fault: output did not follow request {} after {} attempts",
                requested, fault_count
            );
            let mut command = self.command.lock();
            command.faulted = true;
            command.pending = false;
            self.target = None;
            self.stalled = Some(requested);
            return;
        }

        warn!(
            "Relay not settled (attempt {}/{}), retrying",
            fault_count, self.max_attempts
        );
        self.write(requested, now);
    }

    fn settled(&mut self, level: bool) {
        self.target = None;
        self.stalled = None;
        let mut command = self.command.lock();
        command.actual_on = level;
        command.pending = false;
        command.fault_count = 0;
    }

    fn write(&mut self, level: bool, now: Instant) {
        if let Err(e) = self.pin.write(level) {
            warn!("Relay write failed: {}", e);
        }
        self.check_at = Some(now + self.settle_delay);
    }

    /// Step every poll interval until `cancel` fires, then drive the relay off.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => self.step(Instant::now()),
            }
        }

        if let Err(e) = self.pin.write(false) {
            error!("Failed to drop relay on shutdown: {}", e);
        }
        info!("Relay sequencer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpac_hardware::mock::{MockOutputPin, MockOutputPinHandle};

    fn sequencer() -> (RelaySequencer<MockOutputPin>, RelayHandle, MockOutputPinHandle) {
        let (pin, pin_handle) = MockOutputPin::new();
        let (sequencer, relay) = RelaySequencer::new(pin, &ControllerConfig::default());
        (sequencer, relay, pin_handle)
    }

    #[test]
    fn test_idempotent_request_writes_nothing() {
        let (mut sequencer, relay, pin) = sequencer();
        relay.request(false);

        let now = Instant::now();
        for i in 0..10 {
            sequencer.step(now + Duration::from_millis(50 * i));
        }
        assert_eq!(pin.write_count(), 0);
        assert!(!relay.snapshot().pending);
    }

    #[test]
    fn test_request_on_settles() {
        let (mut sequencer, relay, pin) = sequencer();
        let t0 = Instant::now();
        relay.request(true);

        sequencer.step(t0);
        assert_eq!(pin.write_count(), 1);
        let snapshot = relay.snapshot();
        assert!(snapshot.pending);

        sequencer.step(t0 + Duration::from_millis(500));
        assert_eq!(pin.write_count(), 1);

        sequencer.step(t0 + Duration::from_secs(1));
        let snapshot = relay.snapshot();
        assert!(snapshot.actual_on);
        assert!(!snapshot.pending);
        assert!(!snapshot.faulted);

        sequencer.step(t0 + Duration::from_secs(2));
        assert_eq!(pin.write_count(), 1);
    }

    #[test]
    fn test_stuck_relay_faults_after_max_attempts() {
        let (mut sequencer, relay, pin) = sequencer();
        pin.set_stuck(Some(false));
        let t0 = Instant::now();
        relay.request(true);

        for second in 0..=10 {
            sequencer.step(t0 + Duration::from_secs(second));
        }

        let snapshot = relay.snapshot();
        assert!(snapshot.faulted);
        assert!(!snapshot.actual_on);
        assert!(!snapshot.pending);
        assert_eq!(snapshot.fault_count, 5);
        assert_eq!(pin.write_count(), 5);
    }

    #[test]
    fn test_fault_stops_auto_retry_but_stays_latched() {
        let (mut sequencer, relay, pin) = sequencer();
        pin.set_stuck(Some(false));
        let t0 = Instant::now();
        relay.request(true);
        for second in 0..=5 {
            sequencer.step(t0 + Duration::from_secs(second));
        }
        assert!(relay.is_faulted());
        let writes = pin.write_count();

        for second in 6..20 {
            sequencer.step(t0 + Duration::from_secs(second));
        }
        assert_eq!(pin.write_count(), writes);

        // Off already matches the stuck level: no write, fault stays.
        relay.request(false);
        sequencer.step(t0 + Duration::from_secs(21));
        assert_eq!(pin.write_count(), writes);
        assert!(relay.is_faulted());
    }

    #[test]
    fn test_recovers_when_relay_follows_on_retry() {
        let (mut sequencer, relay, pin) = sequencer();
        pin.set_stuck(Some(false));
        let t0 = Instant::now();
        relay.request(true);

        sequencer.step(t0);
        sequencer.step(t0 + Duration::from_secs(1));
        assert_eq!(relay.snapshot().fault_count, 1);

        // Released after the second write was ignored; the third one lands.
        pin.set_stuck(None);
        sequencer.step(t0 + Duration::from_secs(2));
        assert_eq!(relay.snapshot().fault_count, 2);
        sequencer.step(t0 + Duration::from_secs(3));
        let snapshot = relay.snapshot();
        assert!(snapshot.actual_on);
        assert_eq!(snapshot.fault_count, 0);
        assert!(!snapshot.faulted);
    }

    #[test]
    fn test_changed_request_mid_cycle_starts_over() {
        let (mut sequencer, relay, pin) = sequencer();
        let t0 = Instant::now();
        relay.request(true);
        sequencer.step(t0);

        relay.request(false);
        sequencer.step(t0 + Duration::from_millis(100));
        assert_eq!(pin.write_count(), 2);
        assert!(!pin.level());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drops_relay_on_cancel() {
        let (sequencer, relay, pin) = sequencer();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(sequencer.run(cancel.clone()));

        relay.request(true);
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(relay.snapshot().actual_on);

        cancel.cancel();
        task.await.unwrap();
        assert!(!pin.level());
    }
}
