//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! claim lifecycle test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data (claim ids, actors, amounts)
//! - `builders`: Builder patterns for claims and bulk requests
//! - `database`: PostgreSQL testcontainer with the schema migrated
//! - `assertions`: Assertion helpers for claims and activity entries
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
