//! Claims domain errors

use thiserror::Error;

use core_kernel::{ClaimId, PortError};
use crate::transition::InvalidTransition;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Malformed input, rejected before any store access
    #[error("Validation error: {0}")]
    Validation(String),

    /// The acting user's role does not grant the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// One or more claims cannot move to the requested status
    #[error("Invalid status transitions")]
    InvalidTransitions(Vec<InvalidTransition>),

    #[error("Claim not found: {0}")]
    ClaimNotFound(ClaimId),

    /// The claim changed between read and conditional write
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PortError),
}

impl ClaimError {
    /// Identifiers of claims whose transition was refused
    pub fn offending_ids(&self) -> Vec<&ClaimId> {
        match self {
            ClaimError::InvalidTransitions(invalid) => invalid.iter().map(|i| &i.claim_id).collect(),
            _ => Vec::new(),
        }
    }

    /// Safe to retry unchanged: nothing was committed
    ///
    /// Input, authorization and transition errors are deterministic and only
    /// succeed after the request is corrected.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClaimError::Persistence(_) | ClaimError::Conflict(_))
    }
}
