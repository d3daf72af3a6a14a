//! Debounce state for one digital input.
//!
//! # State Machine
//!
//! ```text
//!            raw != stable                 window elapsed
//!  Stable ─────────────────► Settling ───────────────────► Stable (committed)
//!    ▲                        │    ▲
//!    │     raw == stable      │    │ raw != stable
//!    └────────────────────────┘    └──── (window restarts)
//! ```
//!
//! The state is pure: callers pass the current instant so the same logic
//! runs under a paused tokio clock in tests.

use std::time::Duration;
use tokio::time::Instant;

/// Outcome of feeding a raw edge into a [`DebouncedSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Raw level matches the stable value; any pending window was cancelled.
    Settled,

    /// A debounce window started for a new level.
    WindowStarted,

    /// A pending window was restarted by another edge.
    WindowRestarted,
}

/// Stable view of a bouncing input.
///
/// `stable` changes only after `raw` has held a different value for at least
/// the window. Any edge during the window restarts it.
#[derive(Debug, Clone)]
pub struct DebouncedSignal {
    raw: bool,
    stable: bool,
    last_change_at: Instant,
    window: Duration,
    pending: bool,
}

impl DebouncedSignal {
    /// Create a signal whose stable value is `initial`.
    pub fn new(initial: bool, window: Duration, now: Instant) -> Self {
        Self {
            raw: initial,
            stable: initial,
            last_change_at: now,
            window,
            pending: false,
        }
    }

    /// Last committed level.
    pub fn stable(&self) -> bool {
        self.stable
    }

    /// Most recently sampled raw level.
    pub fn raw(&self) -> bool {
        self.raw
    }

    /// Instant of the last raw edge.
    pub fn last_change_at(&self) -> Instant {
        self.last_change_at
    }

    /// Record a raw edge sampled at `now`.
    pub fn on_raw(&mut self, level: bool, now: Instant) -> EdgeOutcome {
        self.raw = level;
        self.last_change_at = now;

        if level == self.stable {
            self.pending = false;
            return EdgeOutcome::Settled;
        }

        if std::mem::replace(&mut self.pending, true) {
            EdgeOutcome::WindowRestarted
        } else {
            EdgeOutcome::WindowStarted
        }
    }

    /// When the pending window will commit, if one is running.
    pub fn commit_deadline(&self) -> Option<Instant> {
        self.pending.then(|| self.last_change_at + self.window)
    }

    /// Commit the raw level if its window has elapsed.
    ///
    /// Returns the new stable value when a commit happened.
    pub fn commit(&mut self, now: Instant) -> Option<bool> {
        let deadline = self.commit_deadline()?;
        if now < deadline {
            return None;
        }

        self.pending = false;
        self.stable = self.raw;
        Some(self.stable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(200);

    #[test]
    fn test_commit_after_window() {
        let t0 = Instant::now();
        let mut signal = DebouncedSignal::new(false, WINDOW, t0);

        assert_eq!(signal.on_raw(true, t0), EdgeOutcome::WindowStarted);
        assert_eq!(signal.commit(t0 + Duration::from_millis(199)), None);
        assert!(!signal.stable());

        assert_eq!(signal.commit(t0 + WINDOW), Some(true));
        assert!(signal.stable());
        assert_eq!(signal.commit_deadline(), None);
    }

    #[test]
    fn test_second_edge_restarts_window() {
        let t0 = Instant::now();
        let mut signal = DebouncedSignal::new(false, WINDOW, t0);

        signal.on_raw(true, t0);
        let t1 = t0 + Duration::from_millis(150);
        assert_eq!(signal.on_raw(true, t1), EdgeOutcome::WindowRestarted);

        assert_eq!(signal.commit(t0 + WINDOW), None);
        assert_eq!(signal.commit_deadline(), Some(t1 + WINDOW));
        assert_eq!(signal.commit(t1 + WINDOW), Some(true));
    }

    #[test]
    fn test_bounce_back_cancels_window() {
        let t0 = Instant::now();
        let mut signal = DebouncedSignal::new(true, WINDOW, t0);

        signal.on_raw(false, t0);
        assert_eq!(
            signal.on_raw(true, t0 + Duration::from_millis(20)),
            EdgeOutcome::Settled
        );
        assert_eq!(signal.commit_deadline(), None);
        assert_eq!(signal.commit(t0 + Duration::from_secs(5)), None);
        assert!(signal.stable());
    }

    #[test]
    fn test_continuous_bouncing_never_commits() {
        let t0 = Instant::now();
        let mut signal = DebouncedSignal::new(false, WINDOW, t0);

        for i in 0..50u64 {
            let now = t0 + Duration::from_millis(i * 100);
            signal.on_raw(i % 2 == 0, now);
            assert_eq!(signal.commit(now), None);
        }
        assert!(!signal.stable());
    }
}
