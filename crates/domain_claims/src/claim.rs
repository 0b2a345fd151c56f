//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, Money, NoteId, PatientId, UserId};
use crate::error::ClaimError;
use crate::ports::ClaimPatch;

/// Maximum length of a free-text claim note, in characters
pub const NOTE_MAX_LEN: usize = 2000;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    /// Submitted and awaiting a decision
    Pending,
    /// Approved for payment
    Approved,
    /// Denied by the payer
    Denied,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 3] = [ClaimStatus::Pending, ClaimStatus::Approved, ClaimStatus::Denied];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "PENDING",
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Denied => "DENIED",
        }
    }

    /// APPROVED and DENIED are terminal: nothing leaves them
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Denied)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ClaimStatus::Pending),
            "APPROVED" => Ok(ClaimStatus::Approved),
            "DENIED" => Ok(ClaimStatus::Denied),
            other => Err(ClaimError::Validation(format!(
                "unrecognized claim status '{}': expected one of PENDING, APPROVED, DENIED",
                other
            ))),
        }
    }
}

/// Validated note text: trimmed, non-blank, bounded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NoteText(String);

impl NoteText {
    pub fn parse(raw: &str) -> Result<Self, ClaimError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClaimError::Validation("note must not be blank".to_string()));
        }
        if trimmed.chars().count() > NOTE_MAX_LEN {
            return Err(ClaimError::Validation(format!(
                "note exceeds {} characters",
                NOTE_MAX_LEN
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A free-text note attached to a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimNote {
    pub id: NoteId,
    pub author: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// An insurance claim filed on behalf of a patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub patient_id: PatientId,
    /// Billed amount
    pub amount: Money,
    pub status: ClaimStatus,
    /// Notes, oldest first
    pub notes: Vec<ClaimNote>,
    /// Row version, bumped on every write
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of a claim the transition validator looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSnapshot {
    pub id: ClaimId,
    pub status: ClaimStatus,
    pub version: i64,
}

impl Claim {
    /// Creates a newly submitted claim in PENDING status
    pub fn submit(id: ClaimId, patient_id: PatientId, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id,
            patient_id,
            amount,
            status: ClaimStatus::Pending,
            notes: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn snapshot(&self) -> ClaimSnapshot {
        ClaimSnapshot {
            id: self.id.clone(),
            status: self.status,
            version: self.version,
        }
    }

    /// Applies a store patch. The caller is responsible for having matched
    /// the write predicate first.
    pub fn apply_patch(&mut self, patch: &ClaimPatch) {
        self.status = patch.status;
        if let Some(note) = &patch.note {
            self.notes.push(note.to_claim_note());
        }
        self.version += 1;
        self.updated_at = patch.updated_at;
    }

    pub fn latest_note(&self) -> Option<&ClaimNote> {
        self.notes.last()
    }
}
