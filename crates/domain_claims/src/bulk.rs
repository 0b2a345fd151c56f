//! Bulk status update requests and outcomes

use std::collections::HashSet;

use serde::Serialize;

use core_kernel::ClaimId;
use crate::claim::{ClaimStatus, NoteText};
use crate::error::ClaimError;

/// Most claim ids accepted in one bulk request
pub const MAX_BULK_CLAIMS: usize = 500;

fn too_many_ids(count: usize) -> String {
    format!("at most {} claim ids per request, got {}", MAX_BULK_CLAIMS, count)
}

/// A validated request to move many claims to one status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdateRequest {
    claim_ids: Vec<ClaimId>,
    status: ClaimStatus,
    note: Option<NoteText>,
}

impl BulkUpdateRequest {
    /// Builds a request, dropping duplicate ids (first occurrence wins)
    pub fn new(claim_ids: Vec<ClaimId>, status: ClaimStatus, note: Option<NoteText>) -> Result<Self, ClaimError> {
        if claim_ids.is_empty() {
            return Err(ClaimError::Validation("at least one claim id is required".to_string()));
        }
        if claim_ids.len() > MAX_BULK_CLAIMS {
            return Err(ClaimError::Validation(too_many_ids(claim_ids.len())));
        }

        let mut seen = HashSet::with_capacity(claim_ids.len());
        let unique: Vec<ClaimId> = claim_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        Ok(Self {
            claim_ids: unique,
            status,
            note,
        })
    }

    /// Parses raw wire input, reporting every problem at once
    pub fn parse(raw_ids: &[String], status: &str, note: Option<&str>) -> Result<Self, ClaimError> {
        let mut problems = Vec::new();

        if raw_ids.is_empty() {
            problems.push("at least one claim id is required".to_string());
        }
        if raw_ids.len() > MAX_BULK_CLAIMS {
            problems.push(too_many_ids(raw_ids.len()));
        }

        let mut ids = Vec::with_capacity(raw_ids.len());
        for raw in raw_ids {
            match ClaimId::parse(raw.as_str()) {
                Ok(id) => ids.push(id),
                Err(e) => problems.push(format!("invalid claim id '{}': {}", raw, e)),
            }
        }

        let status = match status.parse::<ClaimStatus>() {
            Ok(status) => Some(status),
            Err(ClaimError::Validation(msg)) => {
                problems.push(msg);
                None
            }
            Err(other) => return Err(other),
        };

        let note = match note.map(NoteText::parse).transpose() {
            Ok(note) => note,
            Err(ClaimError::Validation(msg)) => {
                problems.push(msg);
                None
            }
            Err(other) => return Err(other),
        };

        match status {
            Some(status) if problems.is_empty() => Self::new(ids, status, note),
            _ => Err(ClaimError::Validation(problems.join("; "))),
        }
    }

    pub fn claim_ids(&self) -> &[ClaimId] {
        &self.claim_ids
    }

    pub fn status(&self) -> ClaimStatus {
        self.status
    }

    pub fn note(&self) -> Option<&NoteText> {
        self.note.as_ref()
    }
}

/// Result of a committed bulk update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateOutcome {
    /// Distinct ids in the request
    pub requested: usize,
    /// Rows whose write predicate matched at write time
    pub updated_count: u64,
    pub updated_ids: Vec<ClaimId>,
}
