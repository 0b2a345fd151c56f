//! Activity log repository
//!
//! Insert-only access to `activity_logs`.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Database row for an activity log entry
#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub activity_id: Uuid,
    pub user_id: Uuid,
    pub activity_type: String,
    pub details: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, row: &ActivityRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (activity_id, user_id, activity_type, details, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(row.activity_id)
        .bind(row.user_id)
        .bind(&row.activity_type)
        .bind(&row.details)
        .bind(&row.metadata)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent entries recorded for a user
    pub async fn find_by_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<ActivityRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT activity_id, user_id, activity_type, details, metadata, created_at
            FROM activity_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
