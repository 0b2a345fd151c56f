//! Database Test Utilities
//!
//! Throwaway PostgreSQL containers with the claims schema migrated, for
//! the integration tests of the PostgreSQL adapters.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

use domain_claims::Claim;
use infra_db::{PostgresClaimStore, MIGRATOR};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const IMAGE: (&str, &str) = ("postgres", "16-alpine");
const USER: &str = "rcm";
const PASSWORD: &str = "rcm-test";
const DATABASE: &str = "rcm_test";
const READY_LINE: &str = "database system is ready to accept connections";

/// Connection options for a database listening on `host:port`
pub fn connect_options(host: &str, port: u16) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(host)
        .port(port)
        .username(USER)
        .password(PASSWORD)
        .database(DATABASE)
}

/// A migrated PostgreSQL container; dropped with the value
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies every migration
    pub async fn new() -> Result<Self, BoxError> {
        let (name, tag) = IMAGE;
        let container = GenericImage::new(name, tag)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(READY_LINE))
            .with_env_var("POSTGRES_USER", USER)
            .with_env_var("POSTGRES_PASSWORD", PASSWORD)
            .with_env_var("POSTGRES_DB", DATABASE)
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432).await?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_options(&host, port))
            .await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts claims (with their notes) through the PostgreSQL adapter
    pub async fn seed(&self, claims: &[Claim]) -> Result<PostgresClaimStore, BoxError> {
        let store = PostgresClaimStore::new(self.pool.clone());
        for claim in claims {
            store.insert(claim).await?;
        }
        Ok(store)
    }

    /// Removes all claims, notes and activity entries
    pub async fn clear_data(&self) -> Result<(), sqlx::Error> {
        sqlx::query("TRUNCATE TABLE claim_notes, claims, activity_logs")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

static SHARED: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// One container shared by every test in the binary
///
/// # Panics
///
/// Panics if the container cannot be started
pub async fn shared_test_database() -> Arc<TestDatabase> {
    SHARED
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("failed to start shared PostgreSQL container"),
            )
        })
        .await
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_target_test_database() {
        let options = connect_options("127.0.0.1", 55432);
        assert_eq!(options.get_host(), "127.0.0.1");
        assert_eq!(options.get_port(), 55432);
        assert_eq!(options.get_database(), Some(DATABASE));
        assert_eq!(options.get_username(), USER);
    }
}
