//! Property-based tests for the frame parser.

mod common;

use proptest::prelude::*;
use rpac_core::constants::{END_BYTE, START_BYTE, TOKEN_LENGTH};
use rpac_rfid::FrameParser;

/// Strategy for valid token payloads (printable ASCII).
fn valid_payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0x21u8..=0x7E, TOKEN_LENGTH)
}

/// Strategy for noisy streams biased toward framing bytes.
fn noisy_stream() -> impl Strategy<Value = Vec<u8>> {
    let byte = prop_oneof![
        3 => 0x21u8..=0x7E,
        1 => Just(START_BYTE),
        1 => Just(END_BYTE),
        1 => any::<u8>(),
    ];
    prop::collection::vec(byte, 0..200)
}

proptest! {
    /// Property: every emitted token is exactly the ten bytes between an STX
    /// and the ETX that immediately follows them.
    #[test]
    fn prop_tokens_only_from_exact_frames(stream in noisy_stream()) {
        let mut parser = FrameParser::new();

        for (i, byte) in stream.iter().enumerate() {
            if let Some(token) = parser.push(*byte) {
                prop_assert_eq!(token.as_str().len(), TOKEN_LENGTH);
                prop_assert!(i > TOKEN_LENGTH);
                prop_assert_eq!(stream[i], END_BYTE);
                prop_assert_eq!(stream[i - TOKEN_LENGTH - 1], START_BYTE);
                prop_assert_eq!(&stream[i - TOKEN_LENGTH..i], token.as_bytes().as_slice());
            }
        }
    }

    /// Property: a valid frame is recovered after any amount of noise.
    #[test]
    fn prop_frame_after_noise_is_recovered(
        noise in noisy_stream(),
        payload in valid_payload(),
    ) {
        let mut parser = FrameParser::new();
        for byte in &noise {
            parser.push(*byte);
        }

        let mut last = None;
        for byte in common::frame(&payload) {
            if let Some(token) = parser.push(byte) {
                last = Some(token);
            }
        }

        let token = last.expect("frame after noise must complete");
        prop_assert_eq!(token.as_bytes().as_slice(), payload.as_slice());
    }
}
