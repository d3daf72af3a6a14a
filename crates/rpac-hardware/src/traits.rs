//! Hardware I/O trait definitions.
//!
//! These traits are the contract between the controller and the enclosure's
//! wiring: two digital inputs (presence sensor, power button), two digital
//! outputs (relay, RFID reader power) and the serial byte stream from the
//! RFID reader. Mock implementations live in [`crate::mock`].
//!
//! Pin access is synchronous because GPIO reads and writes complete
//! immediately. The serial source is async so a read can wait for bytes
//! without holding a thread.

use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A digital input line.
///
/// `read` returns the instantaneous level. Edge notification is wired
/// separately through [`EdgeNotifier`](crate::monitor::EdgeNotifier) so that
/// interrupt callbacks never touch pin state themselves.
pub trait InputPin: Send + Sync {
    /// Read the current level of the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be sampled.
    fn read(&self) -> Result<bool>;
}

/// A digital output line that can be read back.
///
/// Reading back the output is how the relay sequencer and the RFID reader
/// verify that a written level actually took effect.
pub trait OutputPin: Send + Sync {
    /// Drive the line to `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected by the device.
    fn write(&self, level: bool) -> Result<()>;

    /// Read back the observed level of the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be sampled.
    fn read(&self) -> Result<bool>;
}

/// A byte-oriented serial receiver.
///
/// # Object Safety
///
/// This trait is NOT object-safe because its methods return `impl Future`.
/// Use it as a generic parameter.
///
/// # Examples
///
/// ```no_run
/// use rpac_hardware::traits::ByteSource;
/// use rpac_hardware::Result;
/// use std::time::Duration;
///
/// async fn drain<S: ByteSource>(source: &mut S) -> Result<usize> {
///     let mut count = 0;
///     while source.read_byte(Duration::from_millis(50)).await?.is_some() {
///         count += 1;
///     }
///     Ok(count)
/// }
/// ```
pub trait ByteSource: Send {
    /// Wait up to `max_wait` for the next byte.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is closed or reports a fault.
    fn read_byte(&mut self, max_wait: Duration) -> impl Future<Output = Result<Option<u8>>> + Send;

    /// Discard anything already buffered on the input side.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is closed or reports a fault.
    fn flush(&mut self) -> impl Future<Output = Result<()>> + Send;
}

impl<T: InputPin + ?Sized> InputPin for Arc<T> {
    fn read(&self) -> Result<bool> {
        (**self).read()
    }
}

impl<T: InputPin + ?Sized> InputPin for Box<T> {
    fn read(&self) -> Result<bool> {
        (**self).read()
    }
}

impl<T: OutputPin + ?Sized> OutputPin for Arc<T> {
    fn write(&self, level: bool) -> Result<()> {
        (**self).write(level)
    }

    fn read(&self) -> Result<bool> {
        (**self).read()
    }
}

impl<S: ByteSource> ByteSource for &mut S {
    fn read_byte(&mut self, max_wait: Duration) -> impl Future<Output = Result<Option<u8>>> + Send {
        (**self).read_byte(max_wait)
    }

    fn flush(&mut self) -> impl Future<Output = Result<()>> + Send {
        (**self).flush()
    }
}
