//! Mock device implementations for testing and development.
//!
//! This module provides simulated pins and a simulated serial line that can
//! be controlled programmatically without requiring physical hardware.

pub mod pin;
pub mod serial;

// Re-export commonly used types
pub use pin::{MockInputPin, MockInputPinHandle, MockOutputPin, MockOutputPinHandle};
pub use serial::{MockSerial, MockSerialHandle};
