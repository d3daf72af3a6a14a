//! Byte-at-a-time parser for RFID reader frames.
//!
//! # Protocol Framing
//!
//! ```text
//! STX  P0 P1 P2 P3 P4 P5 P6 P7 P8 P9  ETX
//! 0x02 <10 printable ASCII bytes>     0x03
//! ```
//!
//! # State Machine
//!
//! ```text
//! ┌───────────┐  STX   ┌────────────┐ 10th byte ┌─────────┐  ETX  ┌──────────┐
//! │ WaitStart │───────►│ Reading(n) │──────────►│ WaitEnd │──────►│ Complete │
//! └───────────┘        └────────────┘           └─────────┘       └──────────┘
//!      ▲  ▲                  │                       │                  │
//!      │  │   violation      │                       │                  │
//!      │  └──────────────────┴───────────────────────┘                  │
//!      └────────────────────────── next byte ───────────────────────────┘
//! ```
//!
//! A violation is any byte that cannot appear at its position: a control
//! byte inside the payload, or anything other than ETX after the tenth
//! payload byte. The partial frame is discarded. If the offending byte is
//! itself STX it opens a new frame immediately, so a frame following a
//! truncated one is not lost.

use rpac_core::Token;
use rpac_core::constants::{END_BYTE, START_BYTE, TOKEN_LENGTH};

/// Parser position within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Scanning for STX; other bytes are discarded.
    WaitStart,

    /// Holding `n` payload bytes (`n < TOKEN_LENGTH`).
    Reading(usize),

    /// All payload bytes held; only ETX is accepted.
    WaitEnd,

    /// Last byte completed a frame.
    Complete,
}

/// Incremental frame parser.
///
/// # Examples
///
/// ```
/// use rpac_rfid::FrameParser;
///
/// let mut parser = FrameParser::new();
/// let mut token = None;
/// for byte in b"\x02ABCD123456\x03" {
///     token = parser.push(*byte).or(token);
/// }
/// assert_eq!(token.unwrap().as_str(), "ABCD123456");
/// ```
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: FrameState,
    payload: [u8; TOKEN_LENGTH],
    violations: u32,
}

impl FrameParser {
    /// Create a parser waiting for STX.
    pub fn new() -> Self {
        Self {
            state: FrameState::WaitStart,
            payload: [0; TOKEN_LENGTH],
            violations: 0,
        }
    }

    /// Current position.
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Partial frames discarded so far.
    pub fn violations(&self) -> u32 {
        self.violations
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = FrameState::WaitStart;
    }

    /// Feed one byte; returns a token when it completes a frame.
    pub fn push(&mut self, byte: u8) -> Option<Token> {
        match self.state {
            FrameState::WaitStart | FrameState::Complete => {
                self.state = if byte == START_BYTE {
                    FrameState::Reading(0)
                } else {
                    FrameState::WaitStart
                };
                None
            }
            FrameState::Reading(n) => {
                if !byte.is_ascii_graphic() {
                    self.violation(byte);
                    return None;
                }
                self.payload[n] = byte;
                self.state = if n + 1 == TOKEN_LENGTH {
                    FrameState::WaitEnd
                } else {
                    FrameState::Reading(n + 1)
                };
                None
            }
            FrameState::WaitEnd if byte == END_BYTE => match Token::from_payload(self.payload) {
                Ok(token) => {
                    self.state = FrameState::Complete;
                    Some(token)
                }
                Err(_) => {
                    self.violation(byte);
                    None
                }
            },
            FrameState::WaitEnd => {
                self.violation(byte);
                None
            }
        }
    }

    fn violation(&mut self, byte: u8) {
        self.violations += 1;
        self.state = if byte == START_BYTE {
            FrameState::Reading(0)
        } else {
            FrameState::WaitStart
        };
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn feed(parser: &mut FrameParser, bytes: &[u8]) -> Vec<Token> {
        bytes.iter().filter_map(|b| parser.push(*b)).collect()
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![START_BYTE];
        bytes.extend_from_slice(payload);
        bytes.push(END_BYTE);
        bytes
    }

    #[test]
    fn test_complete_frame() {
        let mut parser = FrameParser::new();
        let tokens = feed(&mut parser, &frame(b"ABCD123456"));
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_str(), "ABCD123456");
        assert_eq!(parser.state(), FrameState::Complete);
        assert_eq!(parser.violations(), 0);
    }

    #[test]
    fn test_state_progression() {
        let mut parser = FrameParser::new();
        parser.push(START_BYTE);
        assert_eq!(parser.state(), FrameState::Reading(0));
        for (i, b) in b"0123456789".iter().enumerate() {
            parser.push(*b);
            if i < 9 {
                assert_eq!(parser.state(), FrameState::Reading(i + 1));
            }
        }
        assert_eq!(parser.state(), FrameState::WaitEnd);
    }

    #[test]
    fn test_garbage_before_start_is_skipped() {
        let mut parser = FrameParser::new();
        let mut bytes = b"noise\x03\x00".to_vec();
        bytes.extend(frame(b"370018B56E"));
        let tokens = feed(&mut parser, &bytes);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_str(), "370018B56E");
    }

    #[rstest]
    #[case::eleventh_byte_not_etx(b"\x02ABCD1234567\x03".as_slice())]
    #[case::etx_too_early(b"\x02ABCD12345\x03".as_slice())]
    #[case::control_byte_in_payload(b"\x02ABCD\x0012345\x03".as_slice())]
    #[case::space_in_payload(b"\x02ABCD 23456\x03".as_slice())]
    fn test_malformed_frame_is_discarded(#[case] bytes: &[u8]) {
        let mut parser = FrameParser::new();
        assert!(feed(&mut parser, bytes).is_empty());
        assert_eq!(parser.violations(), 1);
    }

    #[test]
    fn test_recovers_after_malformed_frame() {
        let mut parser = FrameParser::new();
        let mut bytes = b"\x02ABCD1234567".to_vec();
        bytes.extend(frame(b"ABCD123456"));
        let tokens = feed(&mut parser, &bytes);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_str(), "ABCD123456");
    }

    #[test]
    fn test_stx_inside_payload_restarts_frame() {
        let mut parser = FrameParser::new();
        let mut bytes = b"\x02ABC".to_vec();
        bytes.extend(frame(b"ZYXW987654"));
        let tokens = feed(&mut parser, &bytes);
        assert_eq!(parser.violations(), 1);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_str(), "ZYXW987654");
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut parser = FrameParser::new();
        let mut bytes = frame(b"AAAAAAAAAA");
        bytes.extend(frame(b"BBBBBBBBBB"));
        let tokens = feed(&mut parser, &bytes);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].as_str(), "BBBBBBBBBB");
    }

    #[test]
    fn test_reset_discards_partial() {
        let mut parser = FrameParser::new();
        feed(&mut parser, b"\x02ABCDE");
        parser.reset();
        assert!(feed(&mut parser, b"12345\x03").is_empty());
        assert_eq!(parser.state(), FrameState::WaitStart);
    }
}
