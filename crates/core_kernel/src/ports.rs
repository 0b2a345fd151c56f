//! Ports and Adapters Infrastructure
//!
//! Shared building blocks for the collaborator traits ("ports") that the
//! claims domain consumes: the claim store, the activity logger and the
//! authorization gate.
//!
//! ```text
//!   interface_api ──► ClaimLifecycleService ──► ClaimStore / ActivityLogger
//!                                                   ▲            ▲
//!                                     PostgreSQL adapter    in-memory mock
//! ```
//!
//! Every port trait extends [`DomainPort`] and reports failures as
//! [`PortError`], so the domain never sees adapter-specific error types.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by an adapter
#[derive(Debug, Error)]
pub enum PortError {
    #[error("{entity_type} {id} does not exist")]
    NotFound { entity_type: String, id: String },

    /// The backing store refused the data (constraint, malformed value)
    #[error("Rejected by store: {message}")]
    Validation { message: String },

    /// A concurrent writer got there first
    #[error("Write conflict: {message}")]
    Conflict { message: String },

    #[error("Store unreachable: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("Adapter failure: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an adapter error, keeping it as the source
    pub fn internal_from<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PortError::Internal {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// Connection drops and timeouts; nothing was committed
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. } | PortError::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker for every port trait, so adapters can sit behind `Arc<dyn _>`
/// in request handlers.
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of probing one adapter, as reported by the readiness endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(adapter_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: Utc::now(),
        }
    }

    /// Builds a result from a probe outcome, timing it from `started`
    pub fn from_probe<E: fmt::Display>(adapter_id: &str, started: Instant, probe: Result<(), E>) -> Self {
        let latency_ms = started.elapsed().as_millis() as u64;
        match probe {
            Ok(()) => Self::healthy(adapter_id, latency_ms),
            Err(e) => Self::unhealthy(adapter_id, latency_ms, e.to_string()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Adapters that can report whether their backing system answers
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let error = PortError::not_found("Claim", "claim-7");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert_eq!(error.to_string(), "Claim claim-7 does not exist");
    }

    #[test]
    fn test_transient_errors() {
        let timeout = PortError::Timeout {
            operation: "update_many".to_string(),
            duration_ms: 5000,
        };
        assert!(timeout.is_transient());
        assert!(PortError::connection("reset by peer").is_transient());
        assert!(!PortError::validation("bad status").is_transient());
        assert!(!PortError::conflict("version moved").is_transient());
    }

    #[test]
    fn test_internal_from_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let error = PortError::internal_from(io);
        assert!(error.source().is_some());
        assert!(error.to_string().contains("disk gone"));
    }

    #[test]
    fn test_from_probe() {
        let ok = HealthCheckResult::from_probe::<String>("db", Instant::now(), Ok(()));
        assert!(ok.is_healthy());

        let failed = HealthCheckResult::from_probe("db", Instant::now(), Err("refused"));
        assert!(!failed.is_healthy());
        assert_eq!(failed.message.as_deref(), Some("refused"));
    }
}
