//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the fields they care about; the rest is filled
//! with plausible fake data.

use chrono::{DateTime, Utc};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use rust_decimal::Decimal;

use core_kernel::{ClaimId, Currency, Money, NoteId, PatientId, UserId};
use domain_claims::{BulkUpdateRequest, Claim, ClaimNote, ClaimStatus};

use crate::fixtures::FIXED_NOW;

/// Builder for [`Claim`] test data
pub struct ClaimBuilder {
    id: ClaimId,
    patient_id: PatientId,
    amount: Money,
    status: ClaimStatus,
    version: i64,
    notes: Vec<ClaimNote>,
    created_at: DateTime<Utc>,
}

impl ClaimBuilder {
    /// Starts a PENDING claim with a random patient and charge
    pub fn new(id: &str) -> Self {
        let cents: i64 = (1_000..5_000_000).fake();
        Self {
            id: ClaimId::parse(id).unwrap(),
            patient_id: PatientId::new_v7(),
            amount: Money::new(Decimal::new(cents, 2), Currency::USD),
            status: ClaimStatus::Pending,
            version: 1,
            notes: Vec::new(),
            created_at: *FIXED_NOW,
        }
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_patient(mut self, patient_id: PatientId) -> Self {
        self.patient_id = patient_id;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Adds a note with random lorem text
    pub fn with_note_by(mut self, author: UserId) -> Self {
        let body: String = Sentence(3..10).fake();
        self.notes.push(ClaimNote {
            id: NoteId::new_v7(),
            author,
            body,
            created_at: self.created_at,
        });
        self
    }

    pub fn build(self) -> Claim {
        let mut claim = Claim::submit(self.id, self.patient_id, self.amount);
        claim.status = self.status;
        claim.version = self.version;
        claim.notes = self.notes;
        claim.created_at = self.created_at;
        claim.updated_at = self.created_at;
        claim
    }
}

/// Builder for [`BulkUpdateRequest`] test data
pub struct BulkRequestBuilder {
    claim_ids: Vec<String>,
    status: String,
    note: Option<String>,
}

impl BulkRequestBuilder {
    pub fn new(status: ClaimStatus) -> Self {
        Self {
            claim_ids: Vec::new(),
            status: status.as_str().to_string(),
            note: None,
        }
    }

    pub fn with_ids(mut self, ids: &[&str]) -> Self {
        self.claim_ids.extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Adds a random lorem note
    pub fn with_fake_note(mut self) -> Self {
        self.note = Some(Sentence(4..12).fake());
        self
    }

    /// Raw JSON body as the HTTP layer receives it
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "claimIds": self.claim_ids,
            "status": self.status,
        });
        if let Some(note) = &self.note {
            body["note"] = serde_json::Value::String(note.clone());
        }
        body
    }

    pub fn build(self) -> BulkUpdateRequest {
        BulkUpdateRequest::parse(&self.claim_ids, &self.status, self.note.as_deref()).unwrap()
    }
}
