//! Claim status transition rules
//!
//! ```text
//!  create ──► PENDING ──┬──► APPROVED   (terminal)
//!                       └──► DENIED     (terminal)
//! ```
//!
//! Every status may be re-requested as a no-op. Nothing leaves a terminal
//! status. The functions here are pure and look at one claim at a time.

use serde::Serialize;
use std::fmt;

use core_kernel::ClaimId;
use crate::claim::{ClaimSnapshot, ClaimStatus};

/// Why a transition was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionViolation {
    /// APPROVED or DENIED back to PENDING
    TerminalRevert,
    /// APPROVED to DENIED or the reverse
    TerminalCross,
}

impl fmt::Display for TransitionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionViolation::TerminalRevert => f.write_str("terminal states do not revert"),
            TransitionViolation::TerminalCross => f.write_str("terminal states do not cross"),
        }
    }
}

/// Decides whether `from -> to` is legal
pub fn check_transition(from: ClaimStatus, to: ClaimStatus) -> Result<(), TransitionViolation> {
    use ClaimStatus::*;

    match (from, to) {
        (Pending, Approved) | (Pending, Denied) => Ok(()),
        (Approved, Pending) | (Denied, Pending) => Err(TransitionViolation::TerminalRevert),
        (Approved, Denied) | (Denied, Approved) => Err(TransitionViolation::TerminalCross),
        (Pending, Pending) | (Approved, Approved) | (Denied, Denied) => Ok(()),
    }
}

pub fn is_legal(from: ClaimStatus, to: ClaimStatus) -> bool {
    check_transition(from, to).is_ok()
}

/// Statuses from which a request for `target` results in an actual write
///
/// Legal no-ops on terminal claims are accepted but never written, so a
/// terminal record is frozen once reached.
pub fn write_predecessors(target: ClaimStatus) -> &'static [ClaimStatus] {
    match target {
        ClaimStatus::Approved | ClaimStatus::Denied | ClaimStatus::Pending => &[ClaimStatus::Pending],
    }
}

/// Whether a claim currently in `current` is written when `target` is requested
pub fn is_written(current: ClaimStatus, target: ClaimStatus) -> bool {
    is_legal(current, target) && write_predecessors(target).contains(&current)
}

/// A refused transition for one claim of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidTransition {
    pub claim_id: ClaimId,
    pub from: ClaimStatus,
    pub to: ClaimStatus,
    pub violation: TransitionViolation,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {} ({})", self.claim_id, self.from, self.to, self.violation)
    }
}

/// Checks every claim independently and returns the refused ones, in input order
pub fn validate_batch(snapshots: &[ClaimSnapshot], target: ClaimStatus) -> Vec<InvalidTransition> {
    snapshots
        .iter()
        .filter_map(|snapshot| {
            check_transition(snapshot.status, target)
                .err()
                .map(|violation| InvalidTransition {
                    claim_id: snapshot.id.clone(),
                    from: snapshot.status,
                    to: target,
                    violation,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ClaimStatus::*;

    fn snapshot(id: &str, status: ClaimStatus) -> ClaimSnapshot {
        ClaimSnapshot {
            id: ClaimId::parse(id).unwrap(),
            status,
            version: 1,
        }
    }

    #[test]
    fn test_pending_may_be_decided() {
        assert!(is_legal(Pending, Approved));
        assert!(is_legal(Pending, Denied));
    }

    #[test]
    fn test_terminal_states_do_not_revert() {
        assert_eq!(check_transition(Approved, Pending), Err(TransitionViolation::TerminalRevert));
        assert_eq!(check_transition(Denied, Pending), Err(TransitionViolation::TerminalRevert));
    }

    #[test]
    fn test_terminal_states_do_not_cross() {
        assert_eq!(check_transition(Approved, Denied), Err(TransitionViolation::TerminalCross));
        assert_eq!(check_transition(Denied, Approved), Err(TransitionViolation::TerminalCross));
    }

    #[test]
    fn test_self_transitions_are_legal() {
        for status in ClaimStatus::ALL {
            assert!(is_legal(status, status));
        }
    }

    #[test]
    fn test_terminal_no_ops_are_not_written() {
        assert!(is_written(Pending, Approved));
        assert!(is_written(Pending, Pending));
        assert!(!is_written(Approved, Approved));
        assert!(!is_written(Denied, Denied));
        assert!(!is_written(Approved, Pending));
    }

    #[test]
    fn test_validate_batch_reports_only_offenders() {
        let batch = vec![snapshot("claim-1", Pending), snapshot("claim-3", Approved)];
        let invalid = validate_batch(&batch, Pending);

        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].claim_id.as_str(), "claim-3");
        assert_eq!(invalid[0].violation, TransitionViolation::TerminalRevert);
    }
}
