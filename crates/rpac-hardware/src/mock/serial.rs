//! Mock serial line for testing and development.
//!
//! The mock models a reader that, like most 125 kHz modules, repeats its
//! frame for as long as a card sits in the field. Tests can also push raw
//! bytes to exercise malformed input.

use crate::traits::ByteSource;
use crate::{HardwareError, Result};
use bytes::{Buf, Bytes, BytesMut};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Default gap between repeated frames while a card is presented.
pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug)]
struct LineState {
    buffer: BytesMut,
    card: Option<Bytes>,
    repeat: Duration,
    next_emit: Instant,
    closed: bool,
    flushes: usize,
}

impl LineState {
    fn next_byte(&mut self, now: Instant) -> Option<u8> {
        if self.buffer.is_empty()
            && let Some(frame) = &self.card
            && now >= self.next_emit
        {
            self.buffer.extend_from_slice(frame);
            self.next_emit = now + self.repeat;
        }

        if self.buffer.has_remaining() {
            Some(self.buffer.get_u8())
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct Shared {
    line: Mutex<LineState>,
    arrived: Notify,
}

/// Mock serial receiver.
///
/// # Examples
///
/// ```
/// use rpac_hardware::mock::MockSerial;
/// use rpac_hardware::traits::ByteSource;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> rpac_hardware::Result<()> {
///     let (mut serial, handle) = MockSerial::new();
///     handle.send(&b"\x02AB"[..]);
///
///     let first = serial.read_byte(Duration::from_millis(10)).await?;
///     assert_eq!(first, Some(0x02));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockSerial {
    shared: Arc<Shared>,
}

impl MockSerial {
    /// Create a mock line with the default frame repeat interval.
    pub fn new() -> (Self, MockSerialHandle) {
        Self::with_repeat_interval(DEFAULT_REPEAT_INTERVAL)
    }

    /// Create a mock line that re-emits a presented frame every `repeat`.
    pub fn with_repeat_interval(repeat: Duration) -> (Self, MockSerialHandle) {
        let shared = Arc::new(Shared {
            line: Mutex::new(LineState {
                buffer: BytesMut::new(),
                card: None,
                repeat,
                next_emit: Instant::now(),
                closed: false,
                flushes: 0,
            }),
            arrived: Notify::new(),
        });

        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockSerialHandle { shared },
        )
    }
}

impl ByteSource for MockSerial {
    async fn read_byte(&mut self, max_wait: Duration) -> Result<Option<u8>> {
        let deadline = Instant::now() + max_wait;

        loop {
            let wake_at = {
                let mut line = self.shared.line.lock();
                if let Some(byte) = line.next_byte(Instant::now()) {
                    return Ok(Some(byte));
                }
                if line.closed {
                    return Err(HardwareError::disconnected("mock serial line"));
                }
                match line.card {
                    Some(_) => line.next_emit.min(deadline),
                    None => deadline,
                }
            };

            if Instant::now() >= deadline {
                return Ok(None);
            }

            tokio::select! {
                _ = self.shared.arrived.notified() => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn flush(&mut self) -> Result<()> {
        let mut line = self.shared.line.lock();
        if line.closed {
            return Err(HardwareError::disconnected("mock serial line"));
        }
        line.buffer.clear();
        line.flushes += 1;
        Ok(())
    }
}

/// Handle for feeding a [`MockSerial`].
#[derive(Debug, Clone)]
pub struct MockSerialHandle {
    shared: Arc<Shared>,
}

impl MockSerialHandle {
    /// Queue raw bytes on the line.
    pub fn send(&self, bytes: impl Into<Bytes>) {
        let bytes = bytes.into();
        self.shared.line.lock().buffer.extend_from_slice(&bytes);
        self.shared.arrived.notify_one();
    }

    /// Start emitting `frame` repeatedly, beginning immediately.
    pub fn present(&self, frame: impl Into<Bytes>) {
        {
            let mut line = self.shared.line.lock();
            line.card = Some(frame.into());
            line.next_emit = Instant::now();
        }
        self.shared.arrived.notify_one();
    }

    /// Stop emitting the presented frame.
    pub fn remove(&self) {
        self.shared.line.lock().card = None;
    }

    /// Close the line; pending and future reads fail.
    pub fn close(&self) {
        self.shared.line.lock().closed = true;
        self.shared.arrived.notify_one();
    }

    /// Number of bytes waiting to be read.
    pub fn pending(&self) -> usize {
        self.shared.line.lock().buffer.len()
    }

    /// Number of flushes performed by the reader.
    pub fn flush_count(&self) -> usize {
        self.shared.line.lock().flushes
    }
}
