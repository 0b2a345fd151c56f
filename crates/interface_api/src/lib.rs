//! HTTP API Layer
//!
//! REST API for the claim lifecycle using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: thin request handlers over `ClaimLifecycleService`
//! - **Middleware**: authentication, rate limiting, audit logging
//! - **DTOs**: camelCase request/response bodies
//! - **Error Handling**: `{ success: false, error, message, details? }` bodies
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, activity, gate, rate_limiter, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod rate_limit;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use domain_claims::{ActivityLogger, AuthorizationGate, ClaimLifecycleService, ClaimStore};

use crate::config::ApiConfig;
use crate::middleware::{audit_middleware, auth_middleware, rate_limit_middleware};
use crate::handlers::{claims, health};
use crate::rate_limit::RateLimitStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ClaimLifecycleService>,
    /// Same store the service writes to; used for readiness
    pub store: Arc<dyn ClaimStore>,
    pub gate: Arc<dyn AuthorizationGate>,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ClaimStore>,
        activity: Arc<dyn ActivityLogger>,
        gate: Arc<dyn AuthorizationGate>,
        rate_limiter: Arc<dyn RateLimitStore>,
        config: ApiConfig,
    ) -> Self {
        Self {
            service: Arc::new(ClaimLifecycleService::new(store.clone(), activity)),
            store,
            gate,
            rate_limiter,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claims_routes = Router::new()
        .route("/", get(claims::list_claims))
        .route("/bulk-status", post(claims::bulk_update_status))
        .route("/:id", get(claims::get_claim))
        .route("/:id/status", put(claims::update_status))
        .route("/:id/notes", post(claims::add_note));

    // Layers run bottom-up: auth, then rate limit, then audit
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
