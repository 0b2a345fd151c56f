//! Authentication and authorization
//!
//! Bearer tokens are HS256 JWTs whose `sub` is the staff user id and whose
//! `role` is one of the closed set of [`Role`]s. Issuing tokens belongs to
//! the login flow; [`create_token`] exists for tooling and tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use core_kernel::{DomainPort, PortError, UserId};
use domain_claims::{Actor, AuthorizationGate, Credentials, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Unknown role strings fail deserialization and so the whole token
    pub role: Role,
    pub iss: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Creates a signed token for `user_id` acting as `role`
pub fn create_token(
    user_id: UserId,
    role: Role,
    secret: &str,
    issuer: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iss: issuer.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Validates signature, expiry and issuer
pub fn validate_token(token: &str, secret: &str, issuer: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[issuer]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Authorization gate backed by JWT bearer tokens
#[derive(Clone)]
pub struct JwtAuthorizationGate {
    secret: String,
    issuer: String,
}

impl JwtAuthorizationGate {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
        }
    }
}

impl DomainPort for JwtAuthorizationGate {}

#[async_trait]
impl AuthorizationGate for JwtAuthorizationGate {
    async fn resolve_user(&self, credentials: &Credentials) -> Result<Option<Actor>, PortError> {
        let Credentials::Bearer(token) = credentials;

        let claims = match validate_token(token, &self.secret, &self.issuer) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Bearer token rejected");
                return Ok(None);
            }
        };

        match claims.sub.parse::<UserId>() {
            Ok(id) => Ok(Some(Actor::new(id, claims.role))),
            Err(_) => {
                debug!(sub = %claims.sub, "Token subject is not a user id");
                Ok(None)
            }
        }
    }
}
