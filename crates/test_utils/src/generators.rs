//! Property-Based Test Generators
//!
//! Proptest strategies for claim lifecycle data.

use proptest::prelude::*;

use core_kernel::{ClaimId, Currency, Money, CLAIM_ID_MAX_LEN};
use domain_claims::{Claim, ClaimStatus};

use crate::fixtures::{IdFixtures, FIXED_NOW};

/// Strategy for generating claim statuses
pub fn status_strategy() -> impl Strategy<Value = ClaimStatus> {
    prop_oneof![
        Just(ClaimStatus::Pending),
        Just(ClaimStatus::Approved),
        Just(ClaimStatus::Denied),
    ]
}

/// Strategy for generating the currencies claims are billed in
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::CAD),
        Just(Currency::EUR),
        Just(Currency::GBP),
    ]
}

/// Strategy for generating positive billed amounts
pub fn billed_money_strategy() -> impl Strategy<Value = Money> {
    (1i64..100_000_000i64, currency_strategy())
        .prop_map(|(minor, currency)| Money::from_minor(minor, currency))
}

/// Strategy for generating valid claim identifiers
pub fn claim_id_strategy() -> impl Strategy<Value = ClaimId> {
    "[a-z]{1,8}-[0-9]{1,6}".prop_map(|s| ClaimId::parse(s).unwrap())
}

/// Strategy for generating identifier strings that must be rejected
pub fn invalid_claim_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ \t]{1,4}",
        proptest::collection::vec("[a-z]", CLAIM_ID_MAX_LEN + 1..CLAIM_ID_MAX_LEN + 20)
            .prop_map(|chars| chars.concat()),
    ]
}

/// Strategy for generating acceptable note bodies
pub fn note_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 .,]{0,199}"
}

/// Strategy for generating a batch of claims with distinct ids and mixed statuses
pub fn claim_batch_strategy(max: usize) -> impl Strategy<Value = Vec<Claim>> {
    proptest::collection::vec(status_strategy(), 1..=max).prop_map(|statuses| {
        statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                let mut claim = Claim::submit(
                    ClaimId::parse(format!("claim-{}", i + 1)).unwrap(),
                    IdFixtures::patient_id(),
                    Money::from_minor(25_000, Currency::USD),
                );
                claim.status = status;
                claim.created_at = *FIXED_NOW;
                claim.updated_at = *FIXED_NOW;
                claim
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::NoteText;

    proptest! {
        #[test]
        fn generated_claim_ids_parse(id in claim_id_strategy()) {
            prop_assert!(ClaimId::parse(id.as_str()).is_ok());
        }

        #[test]
        fn invalid_claim_ids_are_rejected(raw in invalid_claim_id_strategy()) {
            prop_assert!(ClaimId::parse(raw).is_err());
        }

        #[test]
        fn generated_notes_are_accepted(note in note_strategy()) {
            prop_assert!(NoteText::parse(&note).is_ok());
        }

        #[test]
        fn billed_money_is_positive(money in billed_money_strategy()) {
            prop_assert!(money.is_positive());
        }

        #[test]
        fn batches_have_distinct_ids(claims in claim_batch_strategy(12)) {
            let mut ids: Vec<_> = claims.iter().map(|c| c.id.clone()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), claims.len());
        }
    }
}
