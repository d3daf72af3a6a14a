//! Serial byte source backed by the `serialport` crate.
//!
//! `serialport` is blocking, so each read runs on the blocking pool with the
//! port timeout set to the caller's wait budget.

use crate::traits::ByteSource;
use crate::{HardwareError, Result};
use parking_lot::Mutex;
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// RFID reader attached to a UART.
pub struct SerialByteSource {
    port: Arc<Mutex<Box<dyn SerialPort>>>,
    path: String,
}

impl SerialByteSource {
    /// Open `path` at `baud_rate`, 8N1.
    ///
    /// # Errors
    ///
    /// Returns an error if the device does not exist or rejects the settings.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Duration::from_millis(10))
            .open()?;

        info!("Opened serial port {} at {} baud", path, baud_rate);

        Ok(Self {
            port: Arc::new(Mutex::new(port)),
            path: path.to_string(),
        })
    }

    /// Device path this source was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for SerialByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialByteSource")
            .field("path", &self.path)
            .finish()
    }
}

impl ByteSource for SerialByteSource {
    async fn read_byte(&mut self, max_wait: Duration) -> Result<Option<u8>> {
        let port = Arc::clone(&self.port);

        tokio::task::spawn_blocking(move || -> Result<Option<u8>> {
            let mut port = port.lock();
            port.set_timeout(max_wait)?;

            let mut byte = [0u8; 1];
            match port.read(&mut byte) {
                Ok(1) => Ok(Some(byte[0])),
                Ok(_) => Ok(None),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    Ok(None)
                }
                Err(e) => Err(HardwareError::Io(e)),
            }
        })
        .await
        .map_err(|e| HardwareError::communication(format!("serial read task failed: {e}")))?
    }

    async fn flush(&mut self) -> Result<()> {
        debug!("Flushing serial input on {}", self.path);
        self.port.lock().clear(ClearBuffer::Input)?;
        Ok(())
    }
}
