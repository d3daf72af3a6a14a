//! RFID reader protocol.
//!
//! The reader emits `STX + 10 payload bytes + ETX` frames over a 9600 baud
//! serial line. [`FrameParser`] turns the byte stream into [`Token`]s and
//! [`RfidReader::read_token`] wraps one bounded, cancellable read attempt
//! including reader power sequencing.
//!
//! [`Token`]: rpac_core::Token

pub mod error;
pub mod frame;
pub mod reader;

pub use error::{ReadError, Result};
pub use frame::{FrameParser, FrameState};
pub use reader::RfidReader;
