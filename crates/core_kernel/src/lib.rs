//! Core Kernel - Foundational types shared by the revenue-cycle crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Money types with precise decimal arithmetic
//! - Typed identifiers for claims, patients and staff users
//! - Port infrastructure for swappable collaborators (database, mocks)

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{ActivityId, ClaimId, ClaimIdError, NoteId, PatientId, UserId, CLAIM_ID_MAX_LEN};
pub use ports::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};
