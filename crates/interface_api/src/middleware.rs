//! API middleware

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};

use domain_claims::{Actor, Credentials};

use crate::error::ApiError;
use crate::rate_limit::Decision;
use crate::AppState;

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// Resolves the bearer token through the authorization gate and stores the
/// resulting [`Actor`] in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(&request) else {
        warn!("Missing or invalid Authorization header");
        return Err(ApiError::Unauthorized);
    };

    let credentials = Credentials::Bearer(token.to_string());
    match state.gate.resolve_user(&credentials).await {
        Ok(Some(actor)) => {
            request.extensions_mut().insert(actor);
            Ok(next.run(request).await)
        }
        Ok(None) => {
            warn!("Credentials did not resolve to a user");
            Err(ApiError::Unauthorized)
        }
        Err(e) => {
            error!(error = %e, "Authorization gate failure");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

/// Caller key: user id once authenticated, else client address
fn rate_key(request: &Request<Body>) -> String {
    if let Some(actor) = request.extensions().get::<Actor>() {
        return format!("user:{}", actor.id);
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| format!("ip:{}", addr.ip()))
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Fixed-window rate limiting; answers 429 with `Retry-After`
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let key = rate_key(&request);

    let decision = state
        .rate_limiter
        .hit(&key, state.config.rate_limit_window(), state.config.rate_limit_requests)
        .await;

    match decision {
        Decision::Allowed { .. } => Ok(next.run(request).await),
        Decision::Limited { retry_after } => {
            warn!(key = %key, "Rate limit exceeded");
            // Whole seconds, rounded up
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            Err(ApiError::RateLimited { retry_after: secs.max(1) })
        }
    }
}

/// Audit logging middleware
///
/// Logs all API requests for compliance and debugging
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .extensions()
        .get::<Actor>()
        .map(|a| a.id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();

    info!(
        target: "audit",
        method = %method,
        uri = %uri,
        user = %user_id,
        status = status.as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "API request"
    );

    response
}
