//! Pre-built Test Fixtures
//!
//! Ready-to-use data for the claim lifecycle. Values are fixed so that
//! assertions can name them directly.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, Currency, Money, PatientId, UserId};
use domain_claims::{Actor, Claim, ClaimStatus, Role};

/// Timestamp every fixture claim is created at
pub static FIXED_NOW: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Typical office-visit charge
    pub fn usd_office_visit() -> Money {
        Money::new(dec!(250.00), Currency::USD)
    }

    /// Larger inpatient charge
    pub fn usd_inpatient() -> Money {
        Money::new(dec!(18450.75), Currency::USD)
    }

    pub fn cad_visit() -> Money {
        Money::new(dec!(180.00), Currency::CAD)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// `claim-<n>`, matching the ids used throughout the scenarios
    pub fn claim_id(n: u32) -> ClaimId {
        ClaimId::parse(format!("claim-{}", n)).unwrap()
    }

    pub fn patient_id() -> PatientId {
        PatientId::new_v7()
    }

    pub fn user_id() -> UserId {
        UserId::new_v7()
    }
}

/// Fixture for authenticated users
pub struct ActorFixtures;

impl ActorFixtures {
    pub fn admin() -> Actor {
        Actor::new(IdFixtures::user_id(), Role::Admin)
    }

    pub fn staff() -> Actor {
        Actor::new(IdFixtures::user_id(), Role::Staff)
    }

    pub fn viewer() -> Actor {
        Actor::new(IdFixtures::user_id(), Role::Viewer)
    }
}

/// Fixture for claim sets
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// A claim with the given id and status, created at [`FIXED_NOW`]
    pub fn claim(id: &str, status: ClaimStatus) -> Claim {
        let mut claim = Claim::submit(
            ClaimId::parse(id).unwrap(),
            IdFixtures::patient_id(),
            MoneyFixtures::usd_office_visit(),
        );
        claim.status = status;
        claim.created_at = *FIXED_NOW;
        claim.updated_at = *FIXED_NOW;
        claim
    }

    /// claim-1 and claim-2 PENDING, claim-3 APPROVED
    pub fn standard_set() -> Vec<Claim> {
        vec![
            Self::claim("claim-1", ClaimStatus::Pending),
            Self::claim("claim-2", ClaimStatus::Pending),
            Self::claim("claim-3", ClaimStatus::Approved),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_set_statuses() {
        let claims = ClaimFixtures::standard_set();
        let statuses: Vec<_> = claims.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![ClaimStatus::Pending, ClaimStatus::Pending, ClaimStatus::Approved]
        );
        assert!(claims.iter().all(|c| c.version == 1));
    }

    #[test]
    fn test_claim_id_fixture() {
        assert_eq!(IdFixtures::claim_id(7).as_str(), "claim-7");
    }
}
