//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the claim lifecycle using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`]: SQL and row types, one repository per table group
//! - [`adapters`]: implementations of the `domain_claims` ports on top of
//!   the repositories
//! - [`pool`]: pool configuration and embedded migrations
//!
//! Status writes are compare-and-swap on (status, version): a row that
//! changed after it was read is never overwritten.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresClaimStore;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/rcm")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresClaimStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool, MIGRATOR};
pub use error::DatabaseError;
pub use adapters::{PostgresActivityLogger, PostgresClaimStore};
