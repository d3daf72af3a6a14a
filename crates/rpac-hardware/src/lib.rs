//! Hardware I/O layer for the RFID power access controller.
//!
//! This crate provides trait-based abstractions for the enclosure's wiring:
//! two digital inputs (presence sensor and power button), two digital outputs
//! (equipment relay and RFID reader power), and the serial line from the
//! RFID reader. It also hosts the debounced input monitor that turns raw
//! edges into stable signals.
//!
//! # Design Philosophy
//!
//! - **Sync pins, async serial**: GPIO reads and writes complete immediately,
//!   so [`InputPin`] and [`OutputPin`] are plain methods and object-safe. The
//!   serial [`ByteSource`] waits for bytes and is async (RPITIT).
//! - **Producers, not mutators**: edge callbacks only call
//!   [`EdgeNotifier::notify`](monitor::EdgeNotifier::notify); the per-signal
//!   debounce task owns the signal state.
//! - **Error-aware**: all operations return [`Result<T>`] with
//!   [`HardwareError`] detail.
//!
//! # Mock Implementations
//!
//! [`mock`] provides pins and a serial line that tests drive through
//! paired handles. The real UART transport lives behind the
//! `hardware-serial` feature.

pub mod debounce;
pub mod error;
pub mod mock;
pub mod monitor;
pub mod pins;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{ByteSource, InputPin, OutputPin};
pub use types::{BlinkRate, LedColor, Signal};

pub use monitor::{EdgeNotifier, InputMonitor, MonitorHandle, SignalReader};
pub use pins::LatchedOutput;

#[cfg(feature = "hardware-serial")]
pub use serial::SerialByteSource;
