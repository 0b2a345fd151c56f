//! Activity log entries recorded for claim operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use core_kernel::{ActivityId, ClaimId, UserId};
use crate::access::Actor;
use crate::claim::ClaimStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    ClaimBulkStatusUpdate,
    ClaimStatusUpdate,
    ClaimNoteAdded,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::ClaimBulkStatusUpdate => "CLAIM_BULK_STATUS_UPDATE",
            ActivityType::ClaimStatusUpdate => "CLAIM_STATUS_UPDATE",
            ActivityType::ClaimNoteAdded => "CLAIM_NOTE_ADDED",
        }
    }
}

/// One append-only audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub user_id: UserId,
    pub activity_type: ActivityType,
    /// Human-readable summary
    pub details: String,
    /// Structured payload for audit queries
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    fn new(actor: &Actor, activity_type: ActivityType, details: String, metadata: serde_json::Value) -> Self {
        Self {
            id: ActivityId::new_v7(),
            user_id: actor.id,
            activity_type,
            details,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Summarizes a bulk status change
    pub fn bulk_status_update(
        actor: &Actor,
        target: ClaimStatus,
        requested: &[ClaimId],
        updated: &[ClaimId],
    ) -> Self {
        Self::new(
            actor,
            ActivityType::ClaimBulkStatusUpdate,
            format!("Bulk updated {} claims to {}", updated.len(), target),
            json!({
                "status": target,
                "updatedCount": updated.len(),
                "claimIds": requested,
                "updatedClaimIds": updated,
                "role": actor.role,
            }),
        )
    }

    pub fn status_update(actor: &Actor, claim_id: &ClaimId, from: ClaimStatus, to: ClaimStatus) -> Self {
        Self::new(
            actor,
            ActivityType::ClaimStatusUpdate,
            format!("Updated claim {} from {} to {}", claim_id, from, to),
            json!({ "claimId": claim_id, "from": from, "to": to }),
        )
    }

    pub fn note_added(actor: &Actor, claim_id: &ClaimId) -> Self {
        Self::new(
            actor,
            ActivityType::ClaimNoteAdded,
            format!("Added note to claim {}", claim_id),
            json!({ "claimId": claim_id }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;

    #[test]
    fn test_bulk_entry_metadata() {
        let actor = Actor::new(UserId::new(), Role::Admin);
        let ids = vec![ClaimId::parse("claim-1").unwrap(), ClaimId::parse("claim-2").unwrap()];
        let entry = ActivityEntry::bulk_status_update(&actor, ClaimStatus::Approved, &ids, &ids[..1]);

        assert_eq!(entry.activity_type, ActivityType::ClaimBulkStatusUpdate);
        assert_eq!(entry.user_id, actor.id);
        assert_eq!(entry.metadata["updatedCount"], 1);
        assert_eq!(entry.metadata["status"], "APPROVED");
        assert_eq!(entry.metadata["claimIds"][1], "claim-2");
        assert!(entry.details.contains("1 claims to APPROVED"));
    }
}
