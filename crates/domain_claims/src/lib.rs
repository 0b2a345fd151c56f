//! Claim Status Lifecycle Domain
//!
//! Billing staff move claims between statuses one at a time or in bulk.
//! This crate owns the rules for those moves and the workflow that applies
//! them.
//!
//! # Status Model
//!
//! ```text
//!            ┌──────────► APPROVED ──┐
//! PENDING ───┤                       ├──► (terminal; only self-moves allowed)
//!            └──────────► DENIED ────┘
//! ```
//!
//! - A pending claim may move to any status.
//! - A terminal claim may only be "moved" to its own status, which is a
//!   no-op that is accepted but never written.
//! - A bulk update is all-or-nothing: one illegal transition rejects the
//!   batch before anything is written.
//! - Writes are conditional on the status and version observed during
//!   validation, so a concurrent change is never overwritten.
//!
//! # Example
//!
//! ```rust,ignore
//! let request = BulkUpdateRequest::parse(&ids, "APPROVED", Some("payer confirmed"))?;
//! let outcome = service.bulk_update_status(&actor, request).await?;
//! println!("updated {} claims", outcome.updated_count);
//! ```

pub mod claim;
pub mod transition;
pub mod access;
pub mod activity;
pub mod bulk;
pub mod ports;
pub mod service;
pub mod error;

pub use claim::{Claim, ClaimNote, ClaimSnapshot, ClaimStatus, NoteText, NOTE_MAX_LEN};
pub use transition::{
    check_transition, is_legal, is_written, validate_batch, write_predecessors, InvalidTransition,
    TransitionViolation,
};
pub use access::{Actor, Capability, Role};
pub use activity::{ActivityEntry, ActivityType};
pub use bulk::{BulkUpdateOutcome, BulkUpdateRequest, MAX_BULK_CLAIMS};
pub use ports::{
    ActivityLogger, AuthorizationGate, ClaimFilter, ClaimPatch, ClaimQuery, ClaimStore,
    ClaimWriteFilter, Credentials, ExpectedState, NewNote, Page, UpdateResult, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use service::ClaimLifecycleService;
pub use error::ClaimError;
