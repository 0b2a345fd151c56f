//! Custom Test Assertions
//!
//! Assertion helpers that print the claim state involved when they fail.

use domain_claims::{ActivityEntry, ActivityType, Claim, ClaimStatus};
use domain_claims::ports::mock::MockClaimStore;

/// Asserts the stored status of a claim in the mock store
///
/// # Panics
///
/// Panics if the claim is missing or its status differs
pub async fn assert_stored_status(store: &MockClaimStore, id: &str, expected: ClaimStatus) {
    let claim = store
        .claim(id)
        .await
        .unwrap_or_else(|| panic!("claim {} is not in the store", id));
    assert_eq!(
        claim.status, expected,
        "claim {} has status {}, expected {}",
        id, claim.status, expected
    );
}

/// Asserts that every listed claim still has the given status and version
pub async fn assert_untouched(store: &MockClaimStore, expected: &[(&str, ClaimStatus, i64)]) {
    for (id, status, version) in expected {
        let claim = store
            .claim(id)
            .await
            .unwrap_or_else(|| panic!("claim {} is not in the store", id));
        assert_eq!(
            (claim.status, claim.version),
            (*status, *version),
            "claim {} was modified",
            id
        );
    }
}

/// Asserts that a claim carries a note with the given body as its latest note
pub fn assert_latest_note(claim: &Claim, body: &str) {
    let note = claim
        .latest_note()
        .unwrap_or_else(|| panic!("claim {} has no notes", claim.id));
    assert_eq!(note.body, body, "latest note of claim {} differs", claim.id);
}

/// Asserts that exactly one activity entry of the given type was recorded
pub fn assert_single_activity<'a>(entries: &'a [ActivityEntry], kind: ActivityType) -> &'a ActivityEntry {
    let matching: Vec<_> = entries.iter().filter(|e| e.activity_type == kind).collect();
    assert_eq!(
        matching.len(),
        1,
        "expected one {} entry, found {}",
        kind.as_str(),
        matching.len()
    );
    matching[0]
}
