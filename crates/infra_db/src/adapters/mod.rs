//! Domain Adapters
//!
//! PostgreSQL implementations of the claims domain ports. Each adapter
//! implements the port trait, translates between domain models and row
//! types, and converts `DatabaseError` into `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresActivityLogger, PostgresClaimStore};
//!
//! let store = PostgresClaimStore::new(pool.clone());
//! let activity = PostgresActivityLogger::new(pool);
//! ```

pub mod claims;
pub mod activity;

pub use claims::PostgresClaimStore;
pub use activity::PostgresActivityLogger;
