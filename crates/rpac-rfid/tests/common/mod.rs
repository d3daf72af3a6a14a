#![allow(dead_code)]

use rpac_core::constants::{END_BYTE, START_BYTE};
use rpac_hardware::mock::{MockOutputPin, MockOutputPinHandle, MockSerial, MockSerialHandle};
use rpac_rfid::RfidReader;

/// Wrap `payload` in STX/ETX.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 2);
    bytes.push(START_BYTE);
    bytes.extend_from_slice(payload);
    bytes.push(END_BYTE);
    bytes
}

pub struct Rig {
    pub reader: RfidReader<MockSerial, MockOutputPin>,
    pub serial: MockSerialHandle,
    pub power: MockOutputPinHandle,
}

pub fn rig() -> Rig {
    let (serial, serial_handle) = MockSerial::new();
    let (power, power_handle) = MockOutputPin::new();
    Rig {
        reader: RfidReader::new(serial, power),
        serial: serial_handle,
        power: power_handle,
    }
}
