//! Strongly-typed identifiers for domain entities
//!
//! Newtype wrappers keep patient, user and claim identifiers from being
//! mixed up. Patients, users and log entries are keyed by UUID; claims are
//! keyed by an opaque string assigned by the submission workflow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(PatientId, "PAT");
define_id!(UserId, "USR");
define_id!(ActivityId, "ACT");
define_id!(NoteId, "NOTE");

/// Maximum length of a claim identifier
pub const CLAIM_ID_MAX_LEN: usize = 64;

/// Reasons a string is rejected as a claim identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimIdError {
    #[error("claim id must not be empty")]
    Empty,
    #[error("claim id exceeds {CLAIM_ID_MAX_LEN} characters")]
    TooLong,
    #[error("claim id must not contain surrounding whitespace")]
    Whitespace,
}

/// Opaque identifier of a claim record
///
/// The submission workflow assigns these (e.g. `claim-1`, `CLM-2024-000042`);
/// this crate never generates or interprets them beyond basic shape checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimId(String);

impl ClaimId {
    pub fn parse(value: impl Into<String>) -> Result<Self, ClaimIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ClaimIdError::Empty);
        }
        if value.chars().count() > CLAIM_ID_MAX_LEN {
            return Err(ClaimIdError::TooLong);
        }
        if value.trim() != value {
            return Err(ClaimIdError::Whitespace);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClaimId {
    type Err = ClaimIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClaimId {
    type Error = ClaimIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ClaimId> for String {
    fn from(id: ClaimId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_id_display() {
        let id = PatientId::new();
        assert!(id.to_string().starts_with("PAT-"));
    }

    #[test]
    fn test_user_id_parsing() {
        let original = UserId::new();
        let parsed: UserId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_claim_id_shape() {
        assert!(ClaimId::parse("claim-1").is_ok());
        assert_eq!(ClaimId::parse(""), Err(ClaimIdError::Empty));
        assert_eq!(ClaimId::parse(" claim-1"), Err(ClaimIdError::Whitespace));
        assert_eq!(ClaimId::parse("x".repeat(65)), Err(ClaimIdError::TooLong));
    }

    #[test]
    fn test_claim_id_serde_rejects_blank() {
        let result: Result<ClaimId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
