//! Integration tests for the attendance store.
//!
//! These run against SQLite (in-memory for single-connection tests, a
//! temporary file where real connection concurrency matters) and validate
//! the uniqueness, ordering, and referential-integrity invariants.
//!
//! Run with: cargo test --package fingerlog-storage --test integration_store

use chrono::{Duration as ChronoDuration, Utc};
use fingerlog_core::SlotId;
use fingerlog_storage::connection::{Database, DatabaseConfig};
use fingerlog_storage::models::{NewIdentity, VisitFilter};
use fingerlog_storage::repositories::{
    IdentityRepository, SqliteIdentityRepository, SqliteVisitRepository, VisitRepository,
};
use fingerlog_storage::StorageError;
use rstest::rstest;
use std::sync::Arc;
use tokio::sync::Barrier;

fn slot(value: u8) -> SlotId {
    SlotId::new(value).unwrap()
}

async fn repos(db: &Database) -> (SqliteIdentityRepository, SqliteVisitRepository) {
    (
        SqliteIdentityRepository::new(db.pool().clone()),
        SqliteVisitRepository::new(db.pool().clone()),
    )
}

#[tokio::test]
async fn test_register_and_find_by_slot() {
    let db = Database::in_memory().await.unwrap();
    let (identities, _) = repos(&db).await;

    let created = identities
        .register(&NewIdentity::new(slot(3), "Ada Lovelace", "S-1815"))
        .await
        .unwrap();
    assert_eq!(created.slot_id, 3);
    assert_eq!(created.name, "Ada Lovelace");

    let found = identities.find_by_slot(slot(3)).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.external_id, "S-1815");

    assert!(identities.find_by_slot(slot(4)).await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_register_stores_portrait_blob() {
    let db = Database::in_memory().await.unwrap();
    let (identities, _) = repos(&db).await;

    let portrait = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    let created = identities
        .register(&NewIdentity::new(slot(9), "Grace Hopper", "S-1906").portrait(portrait.clone()))
        .await
        .unwrap();

    let found = identities.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.portrait, Some(portrait));

    db.close().await;
}

#[tokio::test]
async fn test_duplicate_slot_is_rejected() {
    let db = Database::in_memory().await.unwrap();
    let (identities, _) = repos(&db).await;

    identities
        .register(&NewIdentity::new(slot(5), "First", "S-1"))
        .await
        .unwrap();

    let error = identities
        .register(&NewIdentity::new(slot(5), "Second", "S-2"))
        .await
        .unwrap_err();
    assert!(matches!(error, StorageError::DuplicateSlot { slot: 5 }));

    // The failed insert persisted nothing.
    assert!(!identities.external_id_exists("S-2").await.unwrap());

    db.close().await;
}

#[tokio::test]
async fn test_duplicate_external_id_is_rejected() {
    let db = Database::in_memory().await.unwrap();
    let (identities, _) = repos(&db).await;

    identities
        .register(&NewIdentity::new(slot(5), "First", "S-1"))
        .await
        .unwrap();

    let error = identities
        .register(&NewIdentity::new(slot(6), "Second", "S-1"))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        StorageError::DuplicateExternalId { .. }
    ));
    assert!(!identities.slot_exists(slot(6)).await.unwrap());

    db.close().await;
}

#[rstest]
#[case::empty_name("", "S-1")]
#[case::blank_name("  ", "S-1")]
#[case::empty_external_id("Ada", "")]
#[tokio::test]
async fn test_empty_fields_are_rejected_before_insert(
    #[case] name: &str,
    #[case] external_id: &str,
) {
    let db = Database::in_memory().await.unwrap();
    let (identities, _) = repos(&db).await;

    let error = identities
        .register(&NewIdentity::new(slot(1), name, external_id))
        .await
        .unwrap_err();
    assert!(matches!(error, StorageError::InvalidInput(_)));

    assert!(!identities.slot_exists(slot(1)).await.unwrap());

    db.close().await;
}

#[tokio::test]
async fn test_exists_helpers() {
    let db = Database::in_memory().await.unwrap();
    let (identities, _) = repos(&db).await;

    assert!(!identities.slot_exists(slot(7)).await.unwrap());
    assert!(!identities.external_id_exists("S-7").await.unwrap());

    identities
        .register(&NewIdentity::new(slot(7), "Seven", "S-7"))
        .await
        .unwrap();

    assert!(identities.slot_exists(slot(7)).await.unwrap());
    assert!(identities.external_id_exists("S-7").await.unwrap());

    db.close().await;
}

#[tokio::test]
async fn test_list_all_sorted_by_name() {
    let db = Database::in_memory().await.unwrap();
    let (identities, _) = repos(&db).await;

    for (s, name, ext) in [
        (2, "Charlie", "S-C"),
        (1, "Alice", "S-A"),
        (3, "Bob", "S-B"),
    ] {
        identities
            .register(&NewIdentity::new(slot(s), name, ext))
            .await
            .unwrap();
    }

    let names: Vec<String> = identities
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);

    db.close().await;
}

#[tokio::test]
async fn test_record_visit_and_query_newest_first() {
    let db = Database::in_memory().await.unwrap();
    let (identities, visits) = repos(&db).await;

    let identity = identities
        .register(&NewIdentity::new(slot(1), "Ada", "S-1"))
        .await
        .unwrap();

    let first = visits.record(identity.id).await.unwrap();
    let second = visits.record(identity.id).await.unwrap();
    assert!(second.observed_at >= first.observed_at);

    let entries = visits.query(&VisitFilter::new()).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].record_id, second.id);
    assert_eq!(entries[1].record_id, first.id);
    assert_eq!(entries[0].name, "Ada");
    assert_eq!(entries[0].slot_id, 1);

    db.close().await;
}

#[tokio::test]
async fn test_record_visit_for_unknown_identity_fails() {
    let db = Database::in_memory().await.unwrap();
    let (_, visits) = repos(&db).await;

    let error = visits.record(999).await.unwrap_err();
    assert!(matches!(
        error,
        StorageError::UnknownIdentity { identity_id: 999 }
    ));

    assert!(visits.query(&VisitFilter::new()).await.unwrap().is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_query_time_range_bounds_are_inclusive() {
    let db = Database::in_memory().await.unwrap();
    let (identities, visits) = repos(&db).await;

    let identity = identities
        .register(&NewIdentity::new(slot(1), "Ada", "S-1"))
        .await
        .unwrap();
    let visit = visits.record(identity.id).await.unwrap();

    // Exact-boundary range returns the visit.
    let filter = VisitFilter::new().from(visit.observed_at).to(visit.observed_at);
    let entries = visits.query(&filter).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].record_id, visit.id);

    // A range entirely in the past is empty.
    let past = visit.observed_at - ChronoDuration::hours(2);
    let filter = VisitFilter::new()
        .from(past)
        .to(past + ChronoDuration::hours(1));
    assert!(visits.query(&filter).await.unwrap().is_empty());

    // Unbounded below, bounded above.
    let filter = VisitFilter::new().to(Utc::now());
    assert_eq!(visits.query(&filter).await.unwrap().len(), 1);

    db.close().await;
}

#[tokio::test]
async fn test_query_text_filter_matches_name_and_external_id() {
    let db = Database::in_memory().await.unwrap();
    let (identities, visits) = repos(&db).await;

    let ada = identities
        .register(&NewIdentity::new(slot(1), "Ada Lovelace", "S-1815"))
        .await
        .unwrap();
    let grace = identities
        .register(&NewIdentity::new(slot(2), "Grace Hopper", "S-1906"))
        .await
        .unwrap();

    visits.record(ada.id).await.unwrap();
    visits.record(grace.id).await.unwrap();

    // Case-insensitive substring on name.
    let entries = visits
        .query(&VisitFilter::new().text("LOVELACE"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Ada Lovelace");

    // Substring on external id.
    let entries = visits.query(&VisitFilter::new().text("1906")).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Grace Hopper");

    // No match.
    assert!(visits
        .query(&VisitFilter::new().text("nobody"))
        .await
        .unwrap()
        .is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_find_and_delete_visit() {
    let db = Database::in_memory().await.unwrap();
    let (identities, visits) = repos(&db).await;

    let identity = identities
        .register(&NewIdentity::new(slot(1), "Ada", "S-1"))
        .await
        .unwrap();
    let visit = visits.record(identity.id).await.unwrap();

    let entry = visits.find(visit.id).await.unwrap().unwrap();
    assert_eq!(entry.record_id, visit.id);
    assert_eq!(entry.external_id, "S-1");

    assert!(visits.delete(visit.id).await.unwrap());
    assert!(visits.find(visit.id).await.unwrap().is_none());
    assert!(visits.query(&VisitFilter::new()).await.unwrap().is_empty());

    // Idempotent: deleting again reports false and changes nothing.
    assert!(!visits.delete(visit.id).await.unwrap());

    db.close().await;
}

#[tokio::test]
async fn test_concurrent_duplicate_registration_yields_one_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let db = Database::new(DatabaseConfig::new(path.to_string_lossy()))
        .await
        .unwrap();

    const ATTEMPTS: usize = 8;
    let barrier = Arc::new(Barrier::new(ATTEMPTS));
    let mut handles = vec![];

    for i in 0..ATTEMPTS {
        let pool = db.pool().clone();
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            let identities = SqliteIdentityRepository::new(pool);
            barrier.wait().await;
            identities
                .register(&NewIdentity::new(
                    slot(42),
                    format!("Racer {i}"),
                    format!("S-RACE-{i}"),
                ))
                .await
        }));
    }

    let results = futures::future::join_all(handles).await;

    let mut successes = 0;
    let mut duplicates = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(StorageError::DuplicateSlot { slot: 42 }) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(duplicates, ATTEMPTS - 1);

    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='identities'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(result.0, 1);

    db.close().await;
}

#[tokio::test]
async fn test_health_check() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}
