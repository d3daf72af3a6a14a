use crate::{Result, constants::TOKEN_LENGTH, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Trailing characters left visible in logged tokens.
const TOKEN_SHOWN_CHARS: usize = 4;

/// Identifier of the equipment this controller gates (non-zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct EquipmentId(pub(crate) u32);

impl EquipmentId {
    /// Create a new equipment ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidEquipmentId` if the ID is zero.
    pub fn new(id: u32) -> Result<Self> {
        if id == 0 {
            return Err(Error::InvalidEquipmentId(
                "Equipment ID must be non-zero".to_string(),
            ));
        }
        Ok(EquipmentId(id))
    }

    /// Get the raw equipment ID.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for EquipmentId {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self> {
        EquipmentId::new(id)
    }
}

impl From<EquipmentId> for u32 {
    fn from(id: EquipmentId) -> u32 {
        id.0
    }
}

impl std::str::FromStr for EquipmentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u32 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidEquipmentId(format!("Invalid equipment ID: {s}")))?;
        EquipmentId::new(id)
    }
}

/// RFID credential identifier: exactly ten printable ASCII characters.
///
/// Tokens come from completed reader frames or from operator input that
/// passes the same validation, so a `Token` can never hold a truncated or
/// over-long payload.
///
/// # Security
/// Comparison is constant-time so re-authentication does not leak how much
/// of a stored token a presented credential matches. `Debug` and
/// [`redacted`](Token::redacted) mask all but the last four characters; log
/// through those, not `Display`.
#[derive(Clone, Copy, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token([u8; TOKEN_LENGTH]);

impl Token {
    /// Create a token from a frame payload.
    ///
    /// # Errors
    /// Returns `Error::InvalidToken` if any byte is not printable ASCII.
    pub fn from_payload(payload: [u8; TOKEN_LENGTH]) -> Result<Self> {
        if let Some(bad) = payload.iter().find(|b| !b.is_ascii_graphic()) {
            return Err(Error::InvalidToken(format!(
                "Token must be printable ASCII, found byte 0x{bad:02X}"
            )));
        }
        Ok(Token(payload))
    }

    /// Parse a token from text.
    ///
    /// # Errors
    /// Returns `Error::InvalidToken` if the text is not exactly
    /// [`TOKEN_LENGTH`] printable ASCII characters.
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        let payload: [u8; TOKEN_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidToken(format!(
                "Token must be {TOKEN_LENGTH} chars, got {}",
                bytes.len()
            ))
        })?;
        Token::from_payload(payload)
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Construction guarantees printable ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; TOKEN_LENGTH] {
        &self.0
    }

    /// Log-safe form of the token.
    #[must_use]
    pub fn redacted(&self) -> RedactedToken<'_> {
        RedactedToken(self)
    }
}

/// Displays a [`Token`] with all but its last four characters masked.
#[derive(Clone, Copy)]
pub struct RedactedToken<'a>(&'a Token);

impl fmt::Display for RedactedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = self.0.as_str();
        let shown = text.len().saturating_sub(TOKEN_SHOWN_CHARS);
        for _ in 0..shown {
            f.write_str("*")?;
        }
        f.write_str(&text[shown..])
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl std::hash::Hash for Token {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Token")
            .field(&format_args!("{}", self.redacted()))
            .finish()
    }
}

impl std::str::FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Token::parse(s)
    }
}

impl TryFrom<String> for Token {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Token::parse(&s)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> String {
        token.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_token_parse_valid() {
        let token = Token::parse("ABCD123456").unwrap();
        assert_eq!(token.as_str(), "ABCD123456");
        assert_eq!(token.to_string(), "ABCD123456");
        assert_eq!(token.as_bytes().len(), TOKEN_LENGTH);
    }

    #[rstest]
    #[case("")]
    #[case("ABCD12345")]
    #[case("ABCD1234567")]
    #[case("ABCD 23456")]
    #[case("ABCD\u{2}23456")]
    fn test_token_parse_rejects(#[case] text: &str) {
        assert!(matches!(Token::parse(text), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn test_token_from_payload_rejects_control_bytes() {
        let mut payload = *b"ABCD123456";
        payload[9] = 0x03;
        assert!(Token::from_payload(payload).is_err());
    }

    #[test]
    fn test_token_redaction() {
        let token = Token::parse("ABCD123456").unwrap();
        assert_eq!(token.redacted().to_string(), "******3456");
        assert_eq!(format!("{token:?}"), "Token(******3456)");
    }

    #[test]
    fn test_token_equality() {
        let a = Token::parse("370018B56E").unwrap();
        let b: Token = "370018B56E".parse().unwrap();
        let c = Token::parse("370018B56F").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_token_serde_as_string() {
        let token = Token::parse("ABCD123456").unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"ABCD123456\"");

        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);

        assert!(serde_json::from_str::<Token>("\"SHORT\"").is_err());
    }

    #[test]
    fn test_equipment_id_validation() {
        assert!(EquipmentId::new(0).is_err());
        assert_eq!(EquipmentId::new(7).unwrap().as_u32(), 7);
        assert_eq!("12".parse::<EquipmentId>().unwrap().as_u32(), 12);
        assert!("abc".parse::<EquipmentId>().is_err());
    }

    #[test]
    fn test_equipment_id_serde() {
        let id: EquipmentId = serde_json::from_str("3").unwrap();
        assert_eq!(id.as_u32(), 3);
        assert!(serde_json::from_str::<EquipmentId>("0").is_err());
    }
}
