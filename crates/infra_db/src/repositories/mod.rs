//! Repository implementations
//!
//! Repositories own the SQL and map rows to plain structs; the adapters in
//! [`crate::adapters`] turn those rows into domain types.
//!
//! Queries are checked at run time (`query_as` + `FromRow`), so building the
//! crate does not need a live database.

pub mod claims;
pub mod activity;

pub use claims::ClaimsRepository;
pub use activity::ActivityRepository;
