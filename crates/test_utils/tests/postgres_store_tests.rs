//! Integration tests for the PostgreSQL claim store
//!
//! Each test starts its own PostgreSQL container, so they are ignored by
//! default: `cargo test -p test_utils -- --ignored`

use std::sync::Arc;

use domain_claims::{
    ActivityType, BulkUpdateRequest, ClaimError, ClaimLifecycleService, ClaimQuery, ClaimStatus,
    ClaimStore, NoteText,
};
use infra_db::{PostgresActivityLogger, PostgresClaimStore};
use test_utils::{ActorFixtures, ClaimBuilder, ClaimFixtures, TestDatabase};

async fn seeded_service(db: &TestDatabase) -> (ClaimLifecycleService, Arc<PostgresClaimStore>, Arc<PostgresActivityLogger>) {
    let store = Arc::new(db.seed(&ClaimFixtures::standard_set()).await.unwrap());
    let activity = Arc::new(PostgresActivityLogger::new(db.pool().clone()));
    let service = ClaimLifecycleService::new(store.clone(), activity.clone());
    (service, store, activity)
}

fn request(ids: &[&str], status: &str, note: Option<&str>) -> BulkUpdateRequest {
    let raw: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    BulkUpdateRequest::parse(&raw, status, note).unwrap()
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_bulk_approve_writes_status_notes_and_activity() {
    let db = TestDatabase::new().await.unwrap();
    let (service, store, activity) = seeded_service(&db).await;
    let admin = ActorFixtures::admin();

    let outcome = service
        .bulk_update_status(&admin, request(&["claim-1", "claim-2"], "APPROVED", Some("payer confirmed")))
        .await
        .unwrap();
    assert_eq!(outcome.updated_count, 2);

    let claim = store
        .get(&"claim-1".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(claim.status, ClaimStatus::Approved);
    assert_eq!(claim.version, 2);
    assert_eq!(claim.notes.len(), 1);
    assert_eq!(claim.notes[0].body, "payer confirmed");

    let other = store.get(&"claim-2".parse().unwrap()).await.unwrap().unwrap();
    assert_ne!(claim.notes[0].id, other.notes[0].id);

    let rows = activity
        .repository()
        .find_by_user(*admin.id.as_uuid(), 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].activity_type, ActivityType::ClaimBulkStatusUpdate.as_str());
    assert_eq!(rows[0].metadata["updatedCount"], 2);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_invalid_transition_leaves_database_untouched() {
    let db = TestDatabase::new().await.unwrap();
    let (service, store, _activity) = seeded_service(&db).await;

    let err = service
        .bulk_update_status(&ActorFixtures::admin(), request(&["claim-1", "claim-3"], "DENIED", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimError::InvalidTransitions(_)));

    let pending = store.get(&"claim-1".parse().unwrap()).await.unwrap().unwrap();
    assert_eq!(pending.status, ClaimStatus::Pending);
    assert_eq!(pending.version, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_stale_version_is_not_overwritten() {
    let db = TestDatabase::new().await.unwrap();
    let (service, store, _activity) = seeded_service(&db).await;

    // Another writer decides claim-2 first
    sqlx::query("UPDATE claims SET status = 'denied', version = version + 1 WHERE claim_id = 'claim-2'")
        .execute(db.pool())
        .await
        .unwrap();

    let err = service
        .bulk_update_status(&ActorFixtures::admin(), request(&["claim-1", "claim-2"], "APPROVED", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimError::InvalidTransitions(_)));

    let denied = store.get(&"claim-2".parse().unwrap()).await.unwrap().unwrap();
    assert_eq!(denied.status, ClaimStatus::Denied);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_list_and_notes_round_trip() {
    let db = TestDatabase::new().await.unwrap();
    let (service, store, _activity) = seeded_service(&db).await;
    let staff = ActorFixtures::staff();

    store
        .insert(&ClaimBuilder::new("claim-4").with_status(ClaimStatus::Denied).build())
        .await
        .unwrap();

    let claim = service
        .add_note(&staff, &"claim-4".parse().unwrap(), NoteText::parse("appeal filed").unwrap())
        .await
        .unwrap();
    assert_eq!(claim.notes.len(), 1);
    assert_eq!(claim.version, 1);

    let page = service
        .list_claims(&staff, ClaimQuery::new(Some(ClaimStatus::Pending), None, None, None))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|c| c.status == ClaimStatus::Pending));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_health_check_reports_healthy() {
    use core_kernel::HealthCheckable;

    let db = TestDatabase::new().await.unwrap();
    let store = PostgresClaimStore::new(db.pool().clone());
    assert!(store.health_check().await.is_healthy());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_clear_data_between_scenarios() {
    let db = test_utils::shared_test_database().await;
    db.clear_data().await.unwrap();
    let store = db.seed(&ClaimFixtures::standard_set()).await.unwrap();
    assert_eq!(store.count(&Default::default()).await.unwrap(), 3);

    db.clear_data().await.unwrap();
    assert_eq!(store.count(&Default::default()).await.unwrap(), 0);
}
