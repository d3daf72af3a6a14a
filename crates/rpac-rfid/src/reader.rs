//! Single token read against a powered RFID reader.

use crate::error::{ReadError, Result};
use crate::frame::FrameParser;
use rpac_core::Token;
use rpac_core::constants::{DEFAULT_READ_POLL_INTERVAL_MS, FRAME_LENGTH};
use rpac_hardware::{ByteSource, HardwareError, OutputPin};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Times the power output is read back before the reader is declared dead.
pub const POWER_CHECK_ATTEMPTS: u32 = 5;

/// Gap between power read-back checks.
pub const POWER_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Most bytes consumed from the receive buffer once the deadline has passed.
const DRAIN_LIMIT: usize = 4 * FRAME_LENGTH;

/// Turns reader power off when dropped.
struct PowerGuard<'a, P: OutputPin> {
    power: &'a P,
}

impl<'a, P: OutputPin> PowerGuard<'a, P> {
    async fn acquire(power: &'a P) -> Result<Self> {
        power.write(true)?;
        let guard = Self { power };

        for attempt in 1..=POWER_CHECK_ATTEMPTS {
            if power.read()? {
                return Ok(guard);
            }
            debug!("Reader power not up (check {}/{})", attempt, POWER_CHECK_ATTEMPTS);
            tokio::time::sleep(POWER_CHECK_INTERVAL).await;
        }

        Err(HardwareError::not_settled("rfid-power", true).into())
    }
}

impl<P: OutputPin> Drop for PowerGuard<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.power.write(false) {
            warn!("Failed to release reader power: {}", e);
        }
    }
}

/// RFID reader: a serial byte source plus its power output.
///
/// Only one read may be in flight at a time; `read_token` takes `&mut self`
/// so the borrow checker enforces that for a single owner. Callers that
/// share a reader across tasks keep their own single-flight flag.
#[derive(Debug)]
pub struct RfidReader<S, P> {
    source: S,
    power: P,
    poll_interval: Duration,
}

impl<S: ByteSource, P: OutputPin> RfidReader<S, P> {
    /// Create a reader with the default cancel polling interval.
    pub fn new(source: S, power: P) -> Self {
        Self {
            source,
            power,
            poll_interval: Duration::from_millis(DEFAULT_READ_POLL_INTERVAL_MS),
        }
    }

    /// Set how long a single byte wait may last before `cancel` is checked.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Read one token within `timeout`.
    ///
    /// Reader power is on for the duration of the call and off on every
    /// return path. Stale input is flushed before listening. `cancel` is
    /// polled between byte waits; when it returns `true` the read stops with
    /// [`ReadError::Aborted`]. A frame already received when the deadline
    /// arrives is still returned.
    ///
    /// # Errors
    ///
    /// - [`ReadError::Timeout`] when no frame completes in time
    /// - [`ReadError::Aborted`] when `cancel` fired
    /// - [`ReadError::Hardware`] when power does not come up or the line fails
    pub async fn read_token<F>(&mut self, timeout: Duration, cancel: F) -> Result<Token>
    where
        F: Fn() -> bool,
    {
        let Self {
            source,
            power,
            poll_interval,
        } = self;

        let _power = PowerGuard::acquire(&*power).await?;
        source.flush().await?;

        let deadline = Instant::now() + timeout;
        let mut parser = FrameParser::new();
        debug!("Waiting up to {:?} for a token", timeout);

        loop {
            if cancel() {
                info!("Token read aborted");
                return Err(ReadError::Aborted);
            }

            let now = Instant::now();
            if now >= deadline {
                if let Some(token) = drain_buffered(source, &mut parser).await? {
                    info!("Token read at deadline: {}", token.redacted());
                    return Ok(token);
                }
                info!(
                    "Token read timed out ({} malformed frames discarded)",
                    parser.violations()
                );
                return Err(ReadError::timeout(timeout.as_millis() as u64));
            }

            let wait = (*poll_interval).min(deadline - now);
            if let Some(byte) = source.read_byte(wait).await?
                && let Some(token) = parser.push(byte)
            {
                info!("Token read: {}", token.redacted());
                return Ok(token);
            }
        }
    }
}

/// Feed bytes that are already waiting into `parser` without blocking.
///
/// Bounded so a line that never goes quiet cannot hold the read open.
async fn drain_buffered<S: ByteSource>(
    source: &mut S,
    parser: &mut FrameParser,
) -> Result<Option<Token>> {
    for _ in 0..DRAIN_LIMIT {
        match source.read_byte(Duration::ZERO).await? {
            Some(byte) => {
                if let Some(token) = parser.push(byte) {
                    return Ok(Some(token));
                }
            }
            None => break,
        }
    }
    Ok(None)
}
