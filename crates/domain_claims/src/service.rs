//! Claim lifecycle application service
//!
//! Coordinates authorization, transition validation, the conditional store
//! write and audit logging. Every operation checks the actor's capability
//! before touching the store.
//!
//! # Bulk update
//!
//! 1. Read current status and version of every requested claim.
//! 2. Validate each transition independently; any refusal aborts the whole
//!    batch before anything is written.
//! 3. Issue one conditional write whose predicate is exactly the
//!    (status, version) observed in step 1, restricted to claims that the
//!    target actually changes. Rows that moved in the meantime are skipped.
//! 4. Record one activity entry. A logging failure is reported on the
//!    `audit` target and never undoes the committed write.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::ClaimId;

use crate::access::{Actor, Capability};
use crate::activity::ActivityEntry;
use crate::bulk::{BulkUpdateOutcome, BulkUpdateRequest};
use crate::claim::{Claim, ClaimStatus, NoteText};
use crate::error::ClaimError;
use crate::ports::{
    ActivityLogger, ClaimFilter, ClaimPatch, ClaimQuery, ClaimStore, ClaimWriteFilter,
    ExpectedState, NewNote, Page,
};
use crate::transition::{check_transition, is_written, validate_batch, InvalidTransition};

pub struct ClaimLifecycleService {
    store: Arc<dyn ClaimStore>,
    activity: Arc<dyn ActivityLogger>,
}

impl ClaimLifecycleService {
    pub fn new(store: Arc<dyn ClaimStore>, activity: Arc<dyn ActivityLogger>) -> Self {
        Self { store, activity }
    }

    /// Moves every requested claim to the requested status, all-or-nothing
    #[instrument(
        skip(self, actor, request),
        fields(user = %actor.id, status = %request.status(), requested = request.claim_ids().len())
    )]
    pub async fn bulk_update_status(
        &self,
        actor: &Actor,
        request: BulkUpdateRequest,
    ) -> Result<BulkUpdateOutcome, ClaimError> {
        actor.require(Capability::BulkUpdateClaims)?;

        let target = request.status();
        let requested = request.claim_ids().to_vec();

        let snapshots = self
            .store
            .find_many(&ClaimFilter::by_ids(requested.clone()))
            .await?;

        if snapshots.len() < requested.len() {
            let found: HashSet<&ClaimId> = snapshots.iter().map(|s| &s.id).collect();
            let missing: Vec<&ClaimId> = requested.iter().filter(|id| !found.contains(id)).collect();
            debug!(?missing, "Requested claims not found; skipping");
        }

        let invalid = validate_batch(&snapshots, target);
        if !invalid.is_empty() {
            warn!(
                rejected = invalid.len(),
                "Bulk update rejected: illegal status transitions"
            );
            return Err(ClaimError::InvalidTransitions(invalid));
        }

        let filter = ClaimWriteFilter {
            expected: snapshots
                .iter()
                .filter(|s| is_written(s.status, target))
                .map(ExpectedState::from)
                .collect(),
        };

        let updated = if filter.is_empty() {
            Default::default()
        } else {
            let now = Utc::now();
            let patch = ClaimPatch {
                status: target,
                note: request.note().cloned().map(|body| NewNote::new(actor.id, body, now)),
                updated_at: now,
            };
            self.store.update_many(&filter, &patch).await?
        };

        if (updated.count() as usize) < filter.len() {
            info!(
                expected = filter.len(),
                updated = updated.count(),
                "Some claims changed after validation and were left untouched"
            );
        }

        let entry = ActivityEntry::bulk_status_update(actor, target, &requested, &updated.updated_ids);
        self.record_activity(&entry).await;

        info!(updated = updated.count(), "Bulk status update committed");

        Ok(BulkUpdateOutcome {
            requested: requested.len(),
            updated_count: updated.count(),
            updated_ids: updated.updated_ids,
        })
    }

    /// Moves a single claim, returning the claim as stored afterwards
    #[instrument(skip(self, actor, note), fields(user = %actor.id, claim = %id, status = %target))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: &ClaimId,
        target: ClaimStatus,
        note: Option<NoteText>,
    ) -> Result<Claim, ClaimError> {
        actor.require(Capability::UpdateClaimStatus)?;

        let claim = self.load(id).await?;
        let from = claim.status;

        if let Err(violation) = check_transition(from, target) {
            return Err(ClaimError::InvalidTransitions(vec![InvalidTransition {
                claim_id: id.clone(),
                from,
                to: target,
                violation,
            }]));
        }

        if !is_written(from, target) {
            debug!("No-op transition on a terminal claim; nothing written");
            return Ok(claim);
        }

        let now = Utc::now();
        let filter = ClaimWriteFilter {
            expected: vec![ExpectedState::from(&claim.snapshot())],
        };
        let patch = ClaimPatch {
            status: target,
            note: note.map(|body| NewNote::new(actor.id, body, now)),
            updated_at: now,
        };

        let updated = self.store.update_many(&filter, &patch).await?;
        if updated.count() == 0 {
            return Err(ClaimError::Conflict(format!(
                "claim {} changed while it was being updated",
                id
            )));
        }

        self.record_activity(&ActivityEntry::status_update(actor, id, from, target))
            .await;

        self.load(id).await
    }

    #[instrument(skip(self, actor), fields(user = %actor.id, claim = %id))]
    pub async fn get_claim(&self, actor: &Actor, id: &ClaimId) -> Result<Claim, ClaimError> {
        actor.require(Capability::ReadClaims)?;
        self.load(id).await
    }

    #[instrument(skip(self, actor), fields(user = %actor.id))]
    pub async fn list_claims(&self, actor: &Actor, query: ClaimQuery) -> Result<Page<Claim>, ClaimError> {
        actor.require(Capability::ReadClaims)?;

        let items = self.store.list(&query).await?;
        let total = self.store.count(&query.filter()).await?;
        Ok(Page { items, total })
    }

    /// Appends a note without changing status
    #[instrument(skip(self, actor, body), fields(user = %actor.id, claim = %id))]
    pub async fn add_note(&self, actor: &Actor, id: &ClaimId, body: NoteText) -> Result<Claim, ClaimError> {
        actor.require(Capability::AnnotateClaims)?;

        let note = NewNote::new(actor.id, body, Utc::now());
        if !self.store.append_note(id, &note).await? {
            return Err(ClaimError::ClaimNotFound(id.clone()));
        }

        self.record_activity(&ActivityEntry::note_added(actor, id)).await;
        self.load(id).await
    }

    async fn load(&self, id: &ClaimId) -> Result<Claim, ClaimError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ClaimError::ClaimNotFound(id.clone()))
    }

    async fn record_activity(&self, entry: &ActivityEntry) {
        if let Err(e) = self.activity.record(entry).await {
            error!(
                target: "audit",
                activity_id = %entry.id,
                activity_type = entry.activity_type.as_str(),
                user = %entry.user_id,
                error = %e,
                "Activity log write failed; audit trail has a gap"
            );
        }
    }
}
