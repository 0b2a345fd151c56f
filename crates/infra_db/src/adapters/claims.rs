//! PostgreSQL Claim Store Adapter
//!
//! Implements the `ClaimStore` port on top of [`ClaimsRepository`],
//! translating between rows and domain types and between `DatabaseError`
//! and `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimStore;
//! use domain_claims::ClaimStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ClaimStore> = Arc::new(PostgresClaimStore::new(pool));
//! let snapshots = store.find_many(&ClaimFilter::by_ids(ids)).await?;
//! ```

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    ClaimId, Currency, DomainPort, HealthCheckResult, HealthCheckable, Money, MoneyError, NoteId,
    PatientId, PortError, UserId,
};
use domain_claims::{
    Claim, ClaimFilter, ClaimNote, ClaimPatch, ClaimQuery, ClaimSnapshot, ClaimStatus, ClaimStore,
    ClaimWriteFilter, NewNote, UpdateResult,
};

use crate::error::DatabaseError;
use crate::repositories::claims::{
    ClaimNoteRow, ClaimRow, ClaimRowFilter, ClaimStateRow, ClaimStatus as DbClaimStatus,
    ClaimsRepository, ExpectedRow, NewClaim, NewNoteRow,
};

const ADAPTER_ID: &str = "postgres-claim-store";

/// PostgreSQL-backed implementation of the `ClaimStore` port
#[derive(Debug, Clone)]
pub struct PostgresClaimStore {
    repository: ClaimsRepository,
    pool: PgPool,
}

impl PostgresClaimStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns the underlying repository, for seeding and direct queries
    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }

    /// Persists a newly submitted claim
    ///
    /// Claim submission is owned by another workflow; this exists for
    /// seeding and tests.
    #[instrument(skip(self, claim), fields(claim_id = %claim.id))]
    pub async fn insert(&self, claim: &Claim) -> Result<(), PortError> {
        self.repository
            .insert(&NewClaim {
                claim_id: claim.id.as_str().to_string(),
                patient_id: *claim.patient_id.as_uuid(),
                amount: claim.amount.amount(),
                currency: claim.amount.currency().code().to_string(),
                status: claim.status.into(),
                created_at: claim.created_at,
            })
            .await?;
        Ok(())
    }

    async fn attach_notes(&self, rows: Vec<ClaimRow>) -> Result<Vec<Claim>, PortError> {
        let ids: Vec<String> = rows.iter().map(|r| r.claim_id.clone()).collect();
        let mut notes: HashMap<String, Vec<ClaimNote>> = HashMap::new();
        for row in self.repository.notes_for(&ids).await? {
            let claim_id = row.claim_id.clone();
            notes.entry(claim_id).or_default().push(row_to_note(row));
        }

        rows.into_iter()
            .map(|row| {
                let claim_notes = notes.remove(&row.claim_id).unwrap_or_default();
                row_to_claim(row, claim_notes)
            })
            .collect()
    }
}

impl DomainPort for PostgresClaimStore {}

#[async_trait]
impl HealthCheckable for PostgresClaimStore {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let probe = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ());
        HealthCheckResult::from_probe(ADAPTER_ID, started, probe)
    }
}

#[async_trait]
impl ClaimStore for PostgresClaimStore {
    #[instrument(skip(self, filter))]
    async fn find_many(&self, filter: &ClaimFilter) -> Result<Vec<ClaimSnapshot>, PortError> {
        let rows = self.repository.find_states(&to_row_filter(filter)).await?;
        debug!(found = rows.len(), "Fetched claim states");
        rows.into_iter().map(row_to_snapshot).collect()
    }

    #[instrument(skip(self, filter, patch), fields(expected = filter.len(), status = %patch.status))]
    async fn update_many(
        &self,
        filter: &ClaimWriteFilter,
        patch: &ClaimPatch,
    ) -> Result<UpdateResult, PortError> {
        let expected: Vec<ExpectedRow> = filter
            .expected
            .iter()
            .map(|e| ExpectedRow {
                claim_id: e.id.as_str().to_string(),
                status: e.status.into(),
                version: e.version,
            })
            .collect();
        let note = patch.note.as_ref().map(to_note_row);

        let updated = self
            .repository
            .update_where_unchanged(&expected, patch.status.into(), note.as_ref(), patch.updated_at)
            .await?;

        let updated_ids = updated
            .into_iter()
            .map(parse_claim_id)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UpdateResult { updated_ids })
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get(&self, id: &ClaimId) -> Result<Option<Claim>, PortError> {
        match self.repository.get_by_id(id.as_str()).await? {
            Some(row) => Ok(self.attach_notes(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, query), fields(limit = query.limit, offset = query.offset))]
    async fn list(&self, query: &ClaimQuery) -> Result<Vec<Claim>, PortError> {
        let rows = self
            .repository
            .list(&to_row_filter(&query.filter()), i64::from(query.limit), i64::from(query.offset))
            .await?;
        self.attach_notes(rows).await
    }

    async fn count(&self, filter: &ClaimFilter) -> Result<u64, PortError> {
        let count = self.repository.count(&to_row_filter(filter)).await?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self, note), fields(claim_id = %id))]
    async fn append_note(&self, id: &ClaimId, note: &NewNote) -> Result<bool, PortError> {
        Ok(self.repository.append_note(id.as_str(), &to_note_row(note)).await?)
    }
}

impl From<ClaimStatus> for DbClaimStatus {
    fn from(status: ClaimStatus) -> Self {
        match status {
            ClaimStatus::Pending => DbClaimStatus::Pending,
            ClaimStatus::Approved => DbClaimStatus::Approved,
            ClaimStatus::Denied => DbClaimStatus::Denied,
        }
    }
}

impl From<DbClaimStatus> for ClaimStatus {
    fn from(status: DbClaimStatus) -> Self {
        match status {
            DbClaimStatus::Pending => ClaimStatus::Pending,
            DbClaimStatus::Approved => ClaimStatus::Approved,
            DbClaimStatus::Denied => ClaimStatus::Denied,
        }
    }
}

fn to_row_filter(filter: &ClaimFilter) -> ClaimRowFilter {
    ClaimRowFilter {
        claim_ids: filter
            .ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.as_str().to_string()).collect()),
        status: filter.status.map(DbClaimStatus::from),
        patient_id: filter.patient_id.map(|p| *p.as_uuid()),
    }
}

fn to_note_row(note: &NewNote) -> NewNoteRow {
    NewNoteRow {
        author_id: *note.author.as_uuid(),
        body: note.body.as_str().to_string(),
        created_at: note.created_at,
    }
}

fn parse_claim_id(raw: String) -> Result<ClaimId, PortError> {
    ClaimId::parse(raw.as_str()).map_err(|e| DatabaseError::corrupt("Claim", format!("id '{}': {}", raw, e)).into())
}

fn row_to_snapshot(row: ClaimStateRow) -> Result<ClaimSnapshot, PortError> {
    Ok(ClaimSnapshot {
        id: parse_claim_id(row.claim_id)?,
        status: row.status.into(),
        version: row.version,
    })
}

fn row_to_note(row: ClaimNoteRow) -> ClaimNote {
    ClaimNote {
        id: NoteId::from_uuid(row.note_id),
        author: UserId::from_uuid(row.author_id),
        body: row.body,
        created_at: row.created_at,
    }
}

fn row_to_claim(row: ClaimRow, notes: Vec<ClaimNote>) -> Result<Claim, PortError> {
    let corrupt = |e: MoneyError| DatabaseError::corrupt("Claim", format!("{} ({})", e, row.claim_id));
    let currency: Currency = row.currency.parse().map_err(corrupt)?;
    let amount = Money::billed(row.amount, currency).map_err(corrupt)?;

    Ok(Claim {
        id: parse_claim_id(row.claim_id)?,
        patient_id: PatientId::from_uuid(row.patient_id),
        amount,
        status: row.status.into(),
        notes,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
