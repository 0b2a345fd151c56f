//! Claims repository implementation
//!
//! Row-level access to `claims` and `claim_notes`. Status changes go
//! through [`ClaimsRepository::update_where_unchanged`], a compare-and-swap
//! on (status, version) that runs in one transaction together with the note
//! inserts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Mirror of the `claim_status` PostgreSQL enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Denied,
}

impl ClaimStatus {
    /// Label as stored in the enum, for `text[]` parameters cast in SQL
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Denied => "denied",
        }
    }
}

/// Database row for a claim
#[derive(Debug, Clone, FromRow)]
pub struct ClaimRow {
    pub claim_id: String,
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: ClaimStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The columns the transition check needs
#[derive(Debug, Clone, FromRow)]
pub struct ClaimStateRow {
    pub claim_id: String,
    pub status: ClaimStatus,
    pub version: i64,
}

/// Database row for a claim note
#[derive(Debug, Clone, FromRow)]
pub struct ClaimNoteRow {
    pub note_id: Uuid,
    pub claim_id: String,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Optional constraints; `None` matches everything
#[derive(Debug, Clone, Default)]
pub struct ClaimRowFilter {
    pub claim_ids: Option<Vec<String>>,
    pub status: Option<ClaimStatus>,
    pub patient_id: Option<Uuid>,
}

/// Data for inserting a claim
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub claim_id: String,
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
}

/// Note body and author shared by every row a write touches
#[derive(Debug, Clone)]
pub struct NewNoteRow {
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A row may be written only while it still has this status and version
#[derive(Debug, Clone)]
pub struct ExpectedRow {
    pub claim_id: String,
    pub status: ClaimStatus,
    pub version: i64,
}

const CLAIM_COLUMNS: &str =
    "claim_id, patient_id, amount, currency, status, version, created_at, updated_at";

const FILTER_CLAUSE: &str = r#"
    ($1::text[] IS NULL OR claim_id = ANY($1))
    AND ($2::claim_status IS NULL OR status = $2)
    AND ($3::uuid IS NULL OR patient_id = $3)
"#;

/// Repository for claims and their notes
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Status and version of every matching claim, ordered by id
    pub async fn find_states(&self, filter: &ClaimRowFilter) -> Result<Vec<ClaimStateRow>, DatabaseError> {
        let sql = format!(
            "SELECT claim_id, status, version FROM claims WHERE {} ORDER BY claim_id",
            FILTER_CLAUSE
        );

        let rows = sqlx::query_as::<_, ClaimStateRow>(&sql)
            .bind(filter.claim_ids.as_deref())
            .bind(filter.status)
            .bind(filter.patient_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn get_by_id(&self, claim_id: &str) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM claims WHERE claim_id = $1", CLAIM_COLUMNS);

        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// One page of matching claims, newest first
    pub async fn list(
        &self,
        filter: &ClaimRowFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM claims WHERE {} ORDER BY created_at DESC, claim_id LIMIT $4 OFFSET $5",
            CLAIM_COLUMNS, FILTER_CLAUSE
        );

        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(filter.claim_ids.as_deref())
            .bind(filter.status)
            .bind(filter.patient_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn count(&self, filter: &ClaimRowFilter) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM claims WHERE {}", FILTER_CLAUSE);

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.claim_ids.as_deref())
            .bind(filter.status)
            .bind(filter.patient_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Notes of the given claims, oldest first
    pub async fn notes_for(&self, claim_ids: &[String]) -> Result<Vec<ClaimNoteRow>, DatabaseError> {
        if claim_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ClaimNoteRow>(
            r#"
            SELECT note_id, claim_id, author_id, body, created_at
            FROM claim_notes
            WHERE claim_id = ANY($1)
            ORDER BY created_at, note_id
            "#,
        )
        .bind(claim_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sets `status` on every row still matching its expected state
    ///
    /// Bumps the version of each written row and inserts one copy of `note`
    /// per written row, all in one transaction. Returns the ids written.
    pub async fn update_where_unchanged(
        &self,
        expected: &[ExpectedRow],
        status: ClaimStatus,
        note: Option<&NewNoteRow>,
        updated_at: DateTime<Utc>,
    ) -> Result<Vec<String>, DatabaseError> {
        if expected.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = expected.iter().map(|e| e.claim_id.clone()).collect();
        let statuses: Vec<String> = expected.iter().map(|e| e.status.as_db_str().to_string()).collect();
        let versions: Vec<i64> = expected.iter().map(|e| e.version).collect();

        let mut tx = self.pool.begin().await?;

        let updated: Vec<String> = sqlx::query_scalar(
            r#"
            UPDATE claims AS c
            SET status = $4, version = c.version + 1, updated_at = $5
            FROM UNNEST($1::text[], $2::text[], $3::int8[]) AS e(claim_id, status, version)
            WHERE c.claim_id = e.claim_id
              AND c.status = e.status::claim_status
              AND c.version = e.version
            RETURNING c.claim_id
            "#,
        )
        .bind(&ids)
        .bind(&statuses)
        .bind(&versions)
        .bind(status)
        .bind(updated_at)
        .fetch_all(&mut *tx)
        .await?;

        if let Some(note) = note {
            if !updated.is_empty() {
                let note_ids: Vec<Uuid> = updated.iter().map(|_| Uuid::now_v7()).collect();

                sqlx::query(
                    r#"
                    INSERT INTO claim_notes (note_id, claim_id, author_id, body, created_at)
                    SELECT n.note_id, n.claim_id, $3, $4, $5
                    FROM UNNEST($1::uuid[], $2::text[]) AS n(note_id, claim_id)
                    "#,
                )
                .bind(&note_ids)
                .bind(&updated)
                .bind(note.author_id)
                .bind(&note.body)
                .bind(note.created_at)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        debug!(expected = expected.len(), updated = updated.len(), "Conditional claim update committed");
        Ok(updated)
    }

    /// Appends a note; `false` if the claim does not exist
    pub async fn append_note(&self, claim_id: &str, note: &NewNoteRow) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE claims SET updated_at = $2 WHERE claim_id = $1")
            .bind(claim_id)
            .bind(note.created_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if touched == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO claim_notes (note_id, claim_id, author_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(claim_id)
        .bind(note.author_id)
        .bind(&note.body)
        .bind(note.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Inserts a claim at version 1
    pub async fn insert(&self, claim: &NewClaim) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO claims (claim_id, patient_id, amount, currency, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 1, $6, $6)
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );

        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(&claim.claim_id)
            .bind(claim.patient_id)
            .bind(claim.amount)
            .bind(&claim.currency)
            .bind(claim.status)
            .bind(claim.created_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }
}
