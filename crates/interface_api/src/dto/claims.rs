//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_claims::{Claim, ClaimNote, Page};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusUpdateRequest {
    #[validate(length(min = 1, max = 500, message = "between 1 and 500 claim ids are required"))]
    pub claim_ids: Vec<String>,
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusUpdateResponse {
    pub success: bool,
    pub updated_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddNoteRequest {
    #[validate(length(min = 1, message = "note must not be empty"))]
    pub note: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClaimsParams {
    pub status: Option<String>,
    pub patient_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub id: String,
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub version: i64,
    pub notes: Vec<NoteResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPageResponse {
    pub items: Vec<ClaimResponse>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl From<ClaimNote> for NoteResponse {
    fn from(note: ClaimNote) -> Self {
        Self {
            id: *note.id.as_uuid(),
            author_id: *note.author.as_uuid(),
            body: note.body,
            created_at: note.created_at,
        }
    }
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        Self {
            id: claim.id.to_string(),
            patient_id: *claim.patient_id.as_uuid(),
            amount: claim.amount.amount(),
            currency: claim.amount.currency().code().to_string(),
            status: claim.status.as_str().to_string(),
            version: claim.version,
            notes: claim.notes.into_iter().map(NoteResponse::from).collect(),
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

impl ClaimPageResponse {
    pub fn new(page: Page<Claim>, limit: u32, offset: u32) -> Self {
        Self {
            items: page.items.into_iter().map(ClaimResponse::from).collect(),
            total: page.total,
            limit,
            offset,
        }
    }
}
