//! PostgreSQL Activity Logger Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, PortError};
use domain_claims::{ActivityEntry, ActivityLogger};

use crate::repositories::activity::{ActivityRepository, ActivityRow};

/// Writes activity entries to `activity_logs`
#[derive(Debug, Clone)]
pub struct PostgresActivityLogger {
    repository: ActivityRepository,
}

impl PostgresActivityLogger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ActivityRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &ActivityRepository {
        &self.repository
    }
}

impl DomainPort for PostgresActivityLogger {}

#[async_trait]
impl ActivityLogger for PostgresActivityLogger {
    #[instrument(skip(self, entry), fields(activity_id = %entry.id, activity_type = entry.activity_type.as_str()))]
    async fn record(&self, entry: &ActivityEntry) -> Result<(), PortError> {
        let row = ActivityRow {
            activity_id: *entry.id.as_uuid(),
            user_id: *entry.user_id.as_uuid(),
            activity_type: entry.activity_type.as_str().to_string(),
            details: entry.details.clone(),
            metadata: entry.metadata.clone(),
            created_at: entry.created_at,
        };

        self.repository.insert(&row).await?;
        Ok(())
    }
}
