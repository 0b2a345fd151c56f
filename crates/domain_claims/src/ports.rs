//! Claims Domain Ports
//!
//! Port interfaces for the collaborators the claim lifecycle depends on:
//!
//! - [`ClaimStore`]: claim persistence with filtered reads and a
//!   conditional (compare-and-swap) bulk update
//! - [`ActivityLogger`]: append-only audit trail of user actions
//! - [`AuthorizationGate`]: resolves the acting user from request credentials
//!
//! The PostgreSQL adapters live in `infra_db`; in-memory mocks for tests are
//! in [`mock`] (enabled with the `mock` feature).
//!
//! ```rust,ignore
//! let store: Arc<dyn ClaimStore> = Arc::new(PostgresClaimStore::new(pool.clone()));
//! let activity: Arc<dyn ActivityLogger> = Arc::new(PostgresActivityLogger::new(pool));
//! let service = ClaimLifecycleService::new(store, activity);
//! ```

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{ClaimId, DomainPort, HealthCheckable, NoteId, PatientId, PortError, UserId};

use crate::access::Actor;
use crate::activity::ActivityEntry;
use crate::claim::{Claim, ClaimNote, ClaimSnapshot, ClaimStatus, NoteText};

/// Default page size for claim listings
pub const DEFAULT_PAGE_SIZE: u32 = 25;
/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Read filter over claims; `None` fields do not constrain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimFilter {
    pub ids: Option<HashSet<ClaimId>>,
    pub status: Option<ClaimStatus>,
    pub patient_id: Option<PatientId>,
}

impl ClaimFilter {
    pub fn by_ids(ids: impl IntoIterator<Item = ClaimId>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn matches(&self, claim: &Claim) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(&claim.id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if claim.status != status {
                return false;
            }
        }
        if let Some(patient_id) = self.patient_id {
            if claim.patient_id != patient_id {
                return false;
            }
        }
        true
    }
}

/// The state a row must still be in for the conditional write to touch it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedState {
    pub id: ClaimId,
    pub status: ClaimStatus,
    pub version: i64,
}

impl From<&ClaimSnapshot> for ExpectedState {
    fn from(snapshot: &ClaimSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            status: snapshot.status,
            version: snapshot.version,
        }
    }
}

/// Write predicate for [`ClaimStore::update_many`]
///
/// A row is written only if its id, status and version all equal one of the
/// expected states. Rows that moved since they were read are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimWriteFilter {
    pub expected: Vec<ExpectedState>,
}

impl ClaimWriteFilter {
    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expected.len()
    }
}

/// A note about to be appended, stamped with author and time
///
/// The store mints a note id per claim it lands on, so one bulk note
/// becomes one row per updated claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub author: UserId,
    pub body: NoteText,
    pub created_at: DateTime<Utc>,
}

impl NewNote {
    pub fn new(author: UserId, body: NoteText, created_at: DateTime<Utc>) -> Self {
        Self {
            author,
            body,
            created_at,
        }
    }

    pub fn to_claim_note(&self) -> ClaimNote {
        ClaimNote {
            id: NoteId::new_v7(),
            author: self.author,
            body: self.body.as_str().to_string(),
            created_at: self.created_at,
        }
    }
}

/// Changes applied to every row admitted by a [`ClaimWriteFilter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPatch {
    pub status: ClaimStatus,
    pub note: Option<NewNote>,
    pub updated_at: DateTime<Utc>,
}

/// Rows actually changed by a conditional write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub updated_ids: Vec<ClaimId>,
}

impl UpdateResult {
    pub fn count(&self) -> u64 {
        self.updated_ids.len() as u64
    }
}

/// Listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimQuery {
    pub status: Option<ClaimStatus>,
    pub patient_id: Option<PatientId>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ClaimQuery {
    fn default() -> Self {
        Self {
            status: None,
            patient_id: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl ClaimQuery {
    /// Builds a query, clamping the page size into `1..=MAX_PAGE_SIZE`
    pub fn new(status: Option<ClaimStatus>, patient_id: Option<PatientId>, limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            status,
            patient_id,
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }

    /// The filter used to count all matches, ignoring pagination
    pub fn filter(&self) -> ClaimFilter {
        ClaimFilter {
            ids: None,
            status: self.status,
            patient_id: self.patient_id,
        }
    }
}

/// One page of results plus the unpaginated total
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Claim persistence
#[async_trait]
pub trait ClaimStore: DomainPort + HealthCheckable {
    /// Current status and version of every claim matching `filter`
    async fn find_many(&self, filter: &ClaimFilter) -> Result<Vec<ClaimSnapshot>, PortError>;

    /// Applies `patch` to the rows admitted by `filter` in one atomic write
    async fn update_many(
        &self,
        filter: &ClaimWriteFilter,
        patch: &ClaimPatch,
    ) -> Result<UpdateResult, PortError>;

    /// Full claim with its notes
    async fn get(&self, id: &ClaimId) -> Result<Option<Claim>, PortError>;

    /// Claims ordered newest first
    async fn list(&self, query: &ClaimQuery) -> Result<Vec<Claim>, PortError>;

    async fn count(&self, filter: &ClaimFilter) -> Result<u64, PortError>;

    /// Appends a note without touching status; `false` if the claim does not exist
    async fn append_note(&self, id: &ClaimId, note: &NewNote) -> Result<bool, PortError>;
}

/// Append-only activity log
#[async_trait]
pub trait ActivityLogger: DomainPort {
    async fn record(&self, entry: &ActivityEntry) -> Result<(), PortError>;
}

/// Request credentials presented to the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
}

/// Resolves the acting user from credentials
#[async_trait]
pub trait AuthorizationGate: DomainPort {
    /// `Ok(None)` when the credentials do not identify a user
    async fn resolve_user(&self, credentials: &Credentials) -> Result<Option<Actor>, PortError>;
}

/// In-memory port implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::{Mutex, RwLock};
    use core_kernel::HealthCheckResult;

    /// In-memory claim store
    ///
    /// Besides storage it records how often it was called and can be told to
    /// fail writes or to let a concurrent writer slip in between a read and
    /// the conditional update.
    #[derive(Debug, Default)]
    pub struct MockClaimStore {
        claims: Arc<RwLock<HashMap<ClaimId, Claim>>>,
        interleaved: Mutex<Vec<(ClaimId, ClaimStatus)>>,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl MockClaimStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with claims for testing
        pub async fn with_claims(claims: Vec<Claim>) -> Self {
            let store = Self::new();
            for claim in claims {
                store.insert(claim).await;
            }
            store
        }

        pub async fn insert(&self, claim: Claim) {
            self.claims.write().await.insert(claim.id.clone(), claim);
        }

        pub async fn claim(&self, id: &str) -> Option<Claim> {
            let id = ClaimId::parse(id).ok()?;
            self.claims.read().await.get(&id).cloned()
        }

        /// Makes every subsequent `update_many`/`append_note` fail
        pub fn fail_writes(&self) {
            self.fail_writes.store(true, Ordering::SeqCst);
        }

        /// Makes every subsequent read fail
        pub fn fail_reads(&self) {
            self.fail_reads.store(true, Ordering::SeqCst);
        }

        /// Another writer moves `id` to `status` right before the next conditional update
        pub async fn interleave_write(&self, id: &str, status: ClaimStatus) {
            if let Ok(id) = ClaimId::parse(id) {
                self.interleaved.lock().await.push((id, status));
            }
        }

        /// Number of read calls (find/get/list/count)
        pub fn read_calls(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        /// Number of write calls (update_many/append_note)
        pub fn write_calls(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        pub fn total_calls(&self) -> usize {
            self.read_calls() + self.write_calls()
        }

        fn begin_read(&self) -> Result<(), PortError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock store read failure"));
            }
            Ok(())
        }

        fn begin_write(&self) -> Result<(), PortError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock store write failure"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockClaimStore {}

    #[async_trait]
    impl HealthCheckable for MockClaimStore {
        async fn health_check(&self) -> HealthCheckResult {
            if self.fail_reads.load(Ordering::SeqCst) {
                HealthCheckResult::unhealthy("mock-claim-store", 0, "reads are failing")
            } else {
                HealthCheckResult::healthy("mock-claim-store", 0)
            }
        }
    }

    #[async_trait]
    impl ClaimStore for MockClaimStore {
        async fn find_many(&self, filter: &ClaimFilter) -> Result<Vec<ClaimSnapshot>, PortError> {
            self.begin_read()?;
            let claims = self.claims.read().await;
            let mut found: Vec<ClaimSnapshot> = claims
                .values()
                .filter(|c| filter.matches(c))
                .map(Claim::snapshot)
                .collect();
            found.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(found)
        }

        async fn update_many(
            &self,
            filter: &ClaimWriteFilter,
            patch: &ClaimPatch,
        ) -> Result<UpdateResult, PortError> {
            self.begin_write()?;
            let mut claims = self.claims.write().await;

            for (id, status) in self.interleaved.lock().await.drain(..) {
                if let Some(claim) = claims.get_mut(&id) {
                    claim.status = status;
                    claim.version += 1;
                    claim.updated_at = Utc::now();
                }
            }

            let mut result = UpdateResult::default();
            for expected in &filter.expected {
                if let Some(claim) = claims.get_mut(&expected.id) {
                    if claim.status == expected.status && claim.version == expected.version {
                        claim.apply_patch(patch);
                        result.updated_ids.push(claim.id.clone());
                    }
                }
            }
            Ok(result)
        }

        async fn get(&self, id: &ClaimId) -> Result<Option<Claim>, PortError> {
            self.begin_read()?;
            Ok(self.claims.read().await.get(id).cloned())
        }

        async fn list(&self, query: &ClaimQuery) -> Result<Vec<Claim>, PortError> {
            self.begin_read()?;
            let filter = query.filter();
            let claims = self.claims.read().await;
            let mut matching: Vec<Claim> = claims.values().filter(|c| filter.matches(c)).cloned().collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
            Ok(matching
                .into_iter()
                .skip(query.offset as usize)
                .take(query.limit as usize)
                .collect())
        }

        async fn count(&self, filter: &ClaimFilter) -> Result<u64, PortError> {
            self.begin_read()?;
            let claims = self.claims.read().await;
            Ok(claims.values().filter(|c| filter.matches(c)).count() as u64)
        }

        async fn append_note(&self, id: &ClaimId, note: &NewNote) -> Result<bool, PortError> {
            self.begin_write()?;
            let mut claims = self.claims.write().await;
            match claims.get_mut(id) {
                Some(claim) => {
                    claim.notes.push(note.to_claim_note());
                    claim.updated_at = note.created_at;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    /// In-memory activity log
    #[derive(Debug, Default)]
    pub struct MockActivityLogger {
        entries: RwLock<Vec<ActivityEntry>>,
        fail: AtomicBool,
    }

    impl MockActivityLogger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent `record` fail
        pub fn fail_records(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        pub async fn entries(&self) -> Vec<ActivityEntry> {
            self.entries.read().await.clone()
        }
    }

    impl DomainPort for MockActivityLogger {}

    #[async_trait]
    impl ActivityLogger for MockActivityLogger {
        async fn record(&self, entry: &ActivityEntry) -> Result<(), PortError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock activity log unavailable"));
            }
            self.entries.write().await.push(entry.clone());
            Ok(())
        }
    }

    /// Gate backed by a fixed token table
    #[derive(Debug, Default)]
    pub struct MockAuthorizationGate {
        tokens: HashMap<String, Actor>,
    }

    impl MockAuthorizationGate {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_token(mut self, token: impl Into<String>, actor: Actor) -> Self {
            self.tokens.insert(token.into(), actor);
            self
        }
    }

    impl DomainPort for MockAuthorizationGate {}

    #[async_trait]
    impl AuthorizationGate for MockAuthorizationGate {
        async fn resolve_user(&self, credentials: &Credentials) -> Result<Option<Actor>, PortError> {
            let Credentials::Bearer(token) = credentials;
            Ok(self.tokens.get(token).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::mock::MockClaimStore;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    fn claim(id: &str) -> Claim {
        Claim::submit(
            ClaimId::parse(id).unwrap(),
            PatientId::new(),
            Money::new(dec!(100.00), Currency::USD),
        )
    }

    fn patch(status: ClaimStatus) -> ClaimPatch {
        ClaimPatch {
            status,
            note: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_query_clamps_page_size() {
        assert_eq!(ClaimQuery::new(None, None, Some(0), None).limit, 1);
        assert_eq!(ClaimQuery::new(None, None, Some(500), None).limit, MAX_PAGE_SIZE);
        assert_eq!(ClaimQuery::new(None, None, None, None).limit, DEFAULT_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_mock_update_requires_matching_version() {
        let store = MockClaimStore::with_claims(vec![claim("claim-1")]).await;
        let stale = ClaimWriteFilter {
            expected: vec![ExpectedState {
                id: ClaimId::parse("claim-1").unwrap(),
                status: ClaimStatus::Pending,
                version: 7,
            }],
        };

        let result = store.update_many(&stale, &patch(ClaimStatus::Approved)).await.unwrap();
        assert_eq!(result.count(), 0);
        assert_eq!(store.claim("claim-1").await.unwrap().status, ClaimStatus::Pending);
    }

    #[tokio::test]
    async fn test_mock_update_bumps_version() {
        let store = MockClaimStore::with_claims(vec![claim("claim-1")]).await;
        let snapshot = store.claim("claim-1").await.unwrap().snapshot();
        let filter = ClaimWriteFilter {
            expected: vec![ExpectedState::from(&snapshot)],
        };

        let result = store.update_many(&filter, &patch(ClaimStatus::Denied)).await.unwrap();
        assert_eq!(result.count(), 1);

        let updated = store.claim("claim-1").await.unwrap();
        assert_eq!(updated.status, ClaimStatus::Denied);
        assert_eq!(updated.version, snapshot.version + 1);
    }
}
