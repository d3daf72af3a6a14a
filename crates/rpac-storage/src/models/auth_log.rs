use chrono::{DateTime, Utc};
use rpac_core::{EquipmentId, Token};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One authentication attempt.
///
/// # Examples
///
/// ```
/// use rpac_core::{EquipmentId, Token};
/// use rpac_storage::models::{AuthLogEntry, AuthOutcome};
/// use chrono::Utc;
///
/// let token = Token::parse("ABCD123456").unwrap();
/// let entry = AuthLogEntry::new(
///     EquipmentId::new(3).unwrap(),
///     &token,
///     AuthOutcome::Denied,
///     None,
///     Utc::now(),
/// );
/// assert_eq!(entry.get_outcome(), Some(AuthOutcome::Denied));
/// assert!(!entry.was_granted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthLogEntry {
    /// Auto-increment primary key (0 before insert)
    pub id: i64,

    pub equipment_id: i64,

    pub token: String,

    /// Stored code; see [`AuthOutcome`]
    pub outcome: i32,

    /// Error text for failed lookups
    pub detail: Option<String>,

    /// When the attempt happened
    pub timestamp: DateTime<Utc>,
}

impl AuthLogEntry {
    pub fn new(
        equipment: EquipmentId,
        token: &Token,
        outcome: AuthOutcome,
        detail: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            equipment_id: i64::from(equipment.as_u32()),
            token: token.as_str().to_string(),
            outcome: outcome as i32,
            detail,
            timestamp,
        }
    }

    /// Decoded outcome, `None` for an unknown stored code.
    pub fn get_outcome(&self) -> Option<AuthOutcome> {
        AuthOutcome::from_i32(self.outcome)
    }

    pub fn was_granted(&self) -> bool {
        self.get_outcome() == Some(AuthOutcome::Granted)
    }
}

/// Result of an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AuthOutcome {
    /// Token authorized on the equipment
    Granted = 1,

    /// Token not authorized
    Denied = 2,

    /// Store could not answer; treated as a denial
    Error = 3,
}

impl AuthOutcome {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(AuthOutcome::Granted),
            2 => Some(AuthOutcome::Denied),
            3 => Some(AuthOutcome::Error),
            _ => None,
        }
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AuthOutcome::Granted => "granted",
            AuthOutcome::Denied => "denied",
            AuthOutcome::Error => "error",
        };
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, Some(AuthOutcome::Granted))]
    #[case(2, Some(AuthOutcome::Denied))]
    #[case(3, Some(AuthOutcome::Error))]
    #[case(0, None)]
    #[case(4, None)]
    fn test_outcome_codes(#[case] code: i32, #[case] expected: Option<AuthOutcome>) {
        assert_eq!(AuthOutcome::from_i32(code), expected);
    }
}
