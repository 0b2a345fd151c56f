//! API error handling
//!
//! Every failure leaves the API as
//! `{ "success": false, "error": <tag>, "message": <text>, "details"?: [..] }`.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_claims::ClaimError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Illegal status transitions; carries the offending claim ids
    #[error("Invalid status transitions")]
    InvalidTransition(Vec<String>),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },

    #[error("Internal server error: {0}")]
    Internal(String),

    /// Storage failure; the detail is logged, never returned
    #[error("Database error: {0}")]
    Database(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn tag(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::InvalidTransition(_) => "invalid_transition",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::Internal(_) => "internal_error",
            ApiError::Database(_) => "database_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.tag().to_string();

        let (message, details) = match &self {
            ApiError::NotFound(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg) => (msg.clone(), None),
            ApiError::Unauthorized => ("Authentication required".to_string(), None),
            ApiError::InvalidTransition(ids) => (self.to_string(), Some(ids.clone())),
            ApiError::RateLimited { retry_after } => {
                (format!("Rate limit exceeded. Retry after {}s", retry_after), None)
            }
            ApiError::Internal(_) => ("An internal error occurred".to_string(), None),
            ApiError::Database(_) => ("A database error occurred".to_string(), None),
        };

        let body = ErrorResponse {
            success: false,
            error,
            message,
            details,
        };

        let mut response = (status, Json(body)).into_response();

        if let ApiError::RateLimited { retry_after } = &self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Validation(msg) => ApiError::Validation(msg),
            ClaimError::Forbidden(msg) => ApiError::Forbidden(msg),
            ClaimError::InvalidTransitions(invalid) => ApiError::InvalidTransition(
                invalid.iter().map(|i| i.claim_id.to_string()).collect(),
            ),
            ClaimError::ClaimNotFound(id) => ApiError::NotFound(format!("Claim {} not found", id)),
            ClaimError::Conflict(msg) => ApiError::Conflict(msg),
            ClaimError::Persistence(port) => {
                error!(error = %port, transient = port.is_transient(), "Claim store failure");
                ApiError::Database(port.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages.join("; "))
    }
}
