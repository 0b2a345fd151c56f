//! Request rate limiting
//!
//! Counters live behind [`RateLimitStore`] so that several API processes can
//! share one external store. [`InMemoryRateLimitStore`] serves a single
//! process.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Fixed-window request counter keyed by caller
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Counts one request for `key` against `limit` per `window`
    async fn hit(&self, key: &str, window: Duration, limit: u32) -> Decision;
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Process-local counters
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn hit_at(&self, key: &str, window: Duration, limit: u32, now: Instant) -> Decision {
        // A poisoned map only holds counters; keep using it
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        // Expired windows of other callers are dropped lazily
        windows.retain(|_, w| now.duration_since(w.started) < window);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if entry.count >= limit {
            let elapsed = now.duration_since(entry.started);
            return Decision::Limited {
                retry_after: window.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        Decision::Allowed {
            remaining: limit - entry.count,
        }
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str, window: Duration, limit: u32) -> Decision {
        self.hit_at(key, window, limit, Instant::now())
    }
}
