//! Comprehensive tests for domain_claims

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, Currency, Money, PatientId, UserId};

use domain_claims::access::{Actor, Role};
use domain_claims::activity::ActivityType;
use domain_claims::bulk::BulkUpdateRequest;
use domain_claims::claim::{Claim, ClaimStatus, NoteText};
use domain_claims::ports::mock::{MockActivityLogger, MockClaimStore};
use domain_claims::ports::ClaimQuery;
use domain_claims::service::ClaimLifecycleService;
use domain_claims::transition::{check_transition, is_legal, TransitionViolation};
use domain_claims::ClaimError;

// ============================================================================
// Fixtures
// ============================================================================

fn claim(id: &str, status: ClaimStatus) -> Claim {
    let mut claim = Claim::submit(
        ClaimId::parse(id).unwrap(),
        PatientId::new_v7(),
        Money::new(dec!(250.00), Currency::USD),
    );
    claim.status = status;
    claim
}

fn actor(role: Role) -> Actor {
    Actor::new(UserId::new_v7(), role)
}

fn request(ids: &[&str], status: &str, note: Option<&str>) -> BulkUpdateRequest {
    let raw: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    BulkUpdateRequest::parse(&raw, status, note).unwrap()
}

struct Harness {
    service: ClaimLifecycleService,
    store: Arc<MockClaimStore>,
    activity: Arc<MockActivityLogger>,
}

async fn harness(claims: Vec<Claim>) -> Harness {
    let store = Arc::new(MockClaimStore::with_claims(claims).await);
    let activity = Arc::new(MockActivityLogger::new());
    Harness {
        service: ClaimLifecycleService::new(store.clone(), activity.clone()),
        store,
        activity,
    }
}

/// claim-1 and claim-2 pending, claim-3 approved
async fn standard_harness() -> Harness {
    harness(vec![
        claim("claim-1", ClaimStatus::Pending),
        claim("claim-2", ClaimStatus::Pending),
        claim("claim-3", ClaimStatus::Approved),
    ])
    .await
}

async fn status_of(store: &MockClaimStore, id: &str) -> ClaimStatus {
    store.claim(id).await.unwrap().status
}

// ============================================================================
// Bulk Update Scenarios
// ============================================================================

mod bulk_update_tests {
    use super::*;

    #[tokio::test]
    async fn test_approve_two_pending_claims() {
        let h = standard_harness().await;

        let outcome = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-1", "claim-2"], "APPROVED", None))
            .await
            .unwrap();

        assert_eq!(outcome.updated_count, 2);
        assert_eq!(outcome.requested, 2);
        assert_eq!(status_of(&h.store, "claim-1").await, ClaimStatus::Approved);
        assert_eq!(status_of(&h.store, "claim-2").await, ClaimStatus::Approved);
        assert_eq!(status_of(&h.store, "claim-3").await, ClaimStatus::Approved);
    }

    #[tokio::test]
    async fn test_revert_to_pending_rejects_whole_batch() {
        let h = standard_harness().await;

        let err = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-1", "claim-3"], "PENDING", None))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid status transitions");
        let offending: Vec<&str> = err.offending_ids().into_iter().map(ClaimId::as_str).collect();
        assert_eq!(offending, vec!["claim-3"]);

        assert_eq!(h.store.write_calls(), 0);
        assert_eq!(h.store.claim("claim-1").await.unwrap().version, 1);
        assert_eq!(status_of(&h.store, "claim-3").await, ClaimStatus::Approved);
        assert!(h.activity.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden_before_store_access() {
        for role in [Role::Staff, Role::Viewer] {
            let h = standard_harness().await;

            let err = h
                .service
                .bulk_update_status(&actor(role), request(&["claim-1"], "APPROVED", None))
                .await
                .unwrap_err();

            assert!(matches!(err, ClaimError::Forbidden(_)));
            assert_eq!(h.store.total_calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_input_never_reaches_service() {
        let err = BulkUpdateRequest::parse(&[], "CLOSED", None).unwrap_err();
        assert!(matches!(err, ClaimError::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_write_failure_is_persistence_error_without_activity() {
        let h = standard_harness().await;
        h.store.fail_writes();

        let err = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-1"], "DENIED", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::Persistence(_)));
        assert!(err.is_retryable());
        assert!(h.activity.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_aborts_before_any_write() {
        let h = standard_harness().await;
        h.store.fail_reads();

        let err = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-1", "claim-2"], "APPROVED", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::Persistence(_)));
        assert!(err.is_retryable());
        assert_eq!(h.store.read_calls(), 1);
        assert_eq!(h.store.write_calls(), 0);
        assert!(h.activity.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_ids_are_skipped() {
        let h = standard_harness().await;

        let outcome = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-1", "claim-404"], "DENIED", None))
            .await
            .unwrap();

        assert_eq!(outcome.requested, 2);
        assert_eq!(outcome.updated_count, 1);
    }

    #[tokio::test]
    async fn test_terminal_self_move_is_accepted_but_not_counted() {
        let h = standard_harness().await;

        let outcome = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-3"], "APPROVED", None))
            .await
            .unwrap();

        assert_eq!(outcome.updated_count, 0);
        assert_eq!(h.store.write_calls(), 0);
        assert_eq!(h.store.claim("claim-3").await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_pending_self_move_is_legal() {
        let h = standard_harness().await;

        let outcome = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-1"], "PENDING", None))
            .await
            .unwrap();

        assert_eq!(outcome.updated_count, 1);
        assert_eq!(status_of(&h.store, "claim-1").await, ClaimStatus::Pending);
    }

    #[tokio::test]
    async fn test_note_is_attached_to_every_updated_claim() {
        let h = standard_harness().await;

        h.service
            .bulk_update_status(
                &actor(Role::Admin),
                request(&["claim-1", "claim-2"], "DENIED", Some("  missing referral  ")),
            )
            .await
            .unwrap();

        for id in ["claim-1", "claim-2"] {
            let stored = h.store.claim(id).await.unwrap();
            assert_eq!(stored.latest_note().map(|n| n.body.as_str()), Some("missing referral"));
        }
        assert!(h.store.claim("claim-3").await.unwrap().notes.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_change_is_not_overwritten() {
        let h = standard_harness().await;
        h.store.interleave_write("claim-2", ClaimStatus::Denied).await;

        let outcome = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-1", "claim-2"], "APPROVED", None))
            .await
            .unwrap();

        assert_eq!(outcome.updated_count, 1);
        assert_eq!(outcome.updated_ids, vec![ClaimId::parse("claim-1").unwrap()]);
        assert_eq!(status_of(&h.store, "claim-2").await, ClaimStatus::Denied);
    }

    #[tokio::test]
    async fn test_activity_records_requested_and_updated_ids() {
        let h = standard_harness().await;
        let admin = actor(Role::Admin);

        h.service
            .bulk_update_status(&admin, request(&["claim-2", "claim-1"], "APPROVED", None))
            .await
            .unwrap();

        let entries = h.activity.entries().await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.user_id, admin.id);
        assert_eq!(entry.activity_type, ActivityType::ClaimBulkStatusUpdate);
        assert_eq!(entry.metadata["updatedCount"], 2);
        assert_eq!(entry.metadata["claimIds"][0], "claim-2");
        assert_eq!(entry.metadata["status"], "APPROVED");
    }

    #[tokio::test]
    async fn test_activity_failure_does_not_undo_update() {
        let h = standard_harness().await;
        h.activity.fail_records();

        let outcome = h
            .service
            .bulk_update_status(&actor(Role::Admin), request(&["claim-1"], "APPROVED", None))
            .await
            .unwrap();

        assert_eq!(outcome.updated_count, 1);
        assert_eq!(status_of(&h.store, "claim-1").await, ClaimStatus::Approved);
    }
}

// ============================================================================
// Single Claim Operations
// ============================================================================

mod single_claim_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_status_returns_refreshed_claim() {
        let h = standard_harness().await;
        let id = ClaimId::parse("claim-1").unwrap();

        let updated = h
            .service
            .update_status(&actor(Role::Admin), &id, ClaimStatus::Denied, Some(NoteText::parse("duplicate").unwrap()))
            .await
            .unwrap();

        assert_eq!(updated.status, ClaimStatus::Denied);
        assert_eq!(updated.version, 2);
        assert_eq!(updated.notes.len(), 1);

        let entries = h.activity.entries().await;
        assert_eq!(entries[0].activity_type, ActivityType::ClaimStatusUpdate);
    }

    #[tokio::test]
    async fn test_update_status_crossing_terminals_is_rejected() {
        let h = standard_harness().await;
        let id = ClaimId::parse("claim-3").unwrap();

        let err = h
            .service
            .update_status(&actor(Role::Admin), &id, ClaimStatus::Denied, None)
            .await
            .unwrap_err();

        match err {
            ClaimError::InvalidTransitions(invalid) => {
                assert_eq!(invalid.len(), 1);
                assert_eq!(invalid[0].violation, TransitionViolation::TerminalCross);
            }
            other => panic!("expected invalid transition, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_status_unknown_claim() {
        let h = standard_harness().await;
        let id = ClaimId::parse("claim-404").unwrap();

        let err = h
            .service
            .update_status(&actor(Role::Admin), &id, ClaimStatus::Approved, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::ClaimNotFound(_)));
    }

    #[tokio::test]
    async fn test_staff_can_read_and_annotate_but_not_update() {
        let h = standard_harness().await;
        let staff = actor(Role::Staff);
        let id = ClaimId::parse("claim-2").unwrap();

        assert!(h.service.get_claim(&staff, &id).await.is_ok());

        let annotated = h
            .service
            .add_note(&staff, &id, NoteText::parse("called payer").unwrap())
            .await
            .unwrap();
        assert_eq!(annotated.status, ClaimStatus::Pending);
        assert_eq!(annotated.notes.len(), 1);

        let err = h
            .service
            .update_status(&staff, &id, ClaimStatus::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_viewer_cannot_annotate() {
        let h = standard_harness().await;
        let id = ClaimId::parse("claim-1").unwrap();

        let err = h
            .service
            .add_note(&actor(Role::Viewer), &id, NoteText::parse("hi").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::Forbidden(_)));
        assert_eq!(h.store.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_list_claims_filters_and_counts() {
        let h = standard_harness().await;

        let page = h
            .service
            .list_claims(
                &actor(Role::Viewer),
                ClaimQuery::new(Some(ClaimStatus::Pending), None, Some(1), None),
            )
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].status, ClaimStatus::Pending);
    }

    #[tokio::test]
    async fn test_read_failure_surfaces_as_persistence_error() {
        let h = standard_harness().await;
        h.store.fail_reads();

        let err = h
            .service
            .get_claim(&actor(Role::Admin), &ClaimId::parse("claim-1").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::Persistence(_)));
    }
}

// ============================================================================
// Properties
// ============================================================================

fn status_strategy() -> impl Strategy<Value = ClaimStatus> {
    prop_oneof![
        Just(ClaimStatus::Pending),
        Just(ClaimStatus::Approved),
        Just(ClaimStatus::Denied),
    ]
}

proptest! {
    #[test]
    fn prop_terminal_claims_never_leave_their_status(
        from in status_strategy(),
        to in status_strategy(),
    ) {
        let legal = is_legal(from, to);
        prop_assert_eq!(legal, !from.is_terminal() || from == to);
        prop_assert_eq!(check_transition(from, to).is_ok(), legal);
    }

    #[test]
    fn prop_batch_is_all_or_nothing(
        statuses in proptest::collection::vec(status_strategy(), 1..8),
        target in status_strategy(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let claims: Vec<Claim> = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| claim(&format!("claim-{}", i), *s))
                .collect();
            let ids: Vec<String> = claims.iter().map(|c| c.id.to_string()).collect();
            let h = harness(claims).await;

            let request = BulkUpdateRequest::parse(&ids, target.as_str(), None).unwrap();
            let result = h.service.bulk_update_status(&actor(Role::Admin), request).await;

            let any_illegal = statuses.iter().any(|s| !is_legal(*s, target));
            match result {
                Ok(outcome) => {
                    assert!(!any_illegal);
                    assert!(outcome.updated_count as usize <= ids.len());
                    let pending = statuses.iter().filter(|s| !s.is_terminal()).count();
                    assert_eq!(outcome.updated_count as usize, pending);
                }
                Err(err) => {
                    assert!(any_illegal);
                    let expected = statuses.iter().filter(|s| !is_legal(**s, target)).count();
                    assert_eq!(err.offending_ids().len(), expected);
                    for (i, s) in statuses.iter().enumerate() {
                        assert_eq!(status_of(&h.store, &format!("claim-{}", i)).await, *s);
                    }
                }
            }
        });
    }
}
