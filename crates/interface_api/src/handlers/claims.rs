//! Claims handlers
//!
//! Each handler checks the caller's capability before it looks at the
//! request body, so an unauthorized caller learns nothing about input
//! validity.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use validator::Validate;

use core_kernel::{ClaimId, PatientId};
use domain_claims::{Actor, BulkUpdateRequest, Capability, ClaimQuery, ClaimStatus, NoteText};

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

fn parse_claim_id(raw: &str) -> Result<ClaimId, ApiError> {
    ClaimId::parse(raw).map_err(|e| ApiError::Validation(format!("invalid claim id '{}': {}", raw, e)))
}

fn parse_note(raw: Option<&str>) -> Result<Option<NoteText>, ApiError> {
    Ok(raw.map(NoteText::parse).transpose()?)
}

/// Lists claims, newest first
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListClaimsParams>,
) -> Result<Json<ApiResponse<ClaimPageResponse>>, ApiError> {
    actor.require(Capability::ReadClaims)?;

    let status = params
        .status
        .as_deref()
        .map(str::parse::<ClaimStatus>)
        .transpose()?;
    let patient_id = params
        .patient_id
        .as_deref()
        .map(|p| {
            p.parse::<PatientId>()
                .map_err(|_| ApiError::Validation(format!("invalid patient id '{}'", p)))
        })
        .transpose()?;

    let query = ClaimQuery::new(status, patient_id, params.limit, params.offset);
    let (limit, offset) = (query.limit, query.offset);

    let page = state.service.list_claims(&actor, query).await?;
    Ok(Json(ApiResponse::ok(ClaimPageResponse::new(page, limit, offset))))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ClaimResponse>>, ApiError> {
    actor.require(Capability::ReadClaims)?;
    let id = parse_claim_id(&id)?;

    let claim = state.service.get_claim(&actor, &id).await?;
    Ok(Json(ApiResponse::ok(claim.into())))
}

/// Moves many claims to one status, all-or-nothing
pub async fn bulk_update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<BulkStatusUpdateRequest>, JsonRejection>,
) -> Result<Json<BulkStatusUpdateResponse>, ApiError> {
    actor.require(Capability::BulkUpdateClaims)?;

    let Json(body) = payload?;
    body.validate()?;
    let request = BulkUpdateRequest::parse(&body.claim_ids, &body.status, body.note.as_deref())?;

    let outcome = state.service.bulk_update_status(&actor, request).await?;

    Ok(Json(BulkStatusUpdateResponse {
        success: true,
        updated_count: outcome.updated_count,
    }))
}

/// Updates one claim's status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ClaimResponse>>, ApiError> {
    actor.require(Capability::UpdateClaimStatus)?;

    let Json(body) = payload?;
    let id = parse_claim_id(&id)?;
    let status: ClaimStatus = body.status.parse()?;
    let note = parse_note(body.note.as_deref())?;

    let claim = state.service.update_status(&actor, &id, status, note).await?;
    Ok(Json(ApiResponse::ok(claim.into())))
}

/// Appends a note to a claim
pub async fn add_note(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<AddNoteRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ClaimResponse>>, ApiError> {
    actor.require(Capability::AnnotateClaims)?;

    let Json(body) = payload?;
    body.validate()?;
    let id = parse_claim_id(&id)?;
    let note = NoteText::parse(&body.note)?;

    let claim = state.service.add_note(&actor, &id, note).await?;
    Ok(Json(ApiResponse::ok(claim.into())))
}
