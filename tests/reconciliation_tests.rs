//! Integration tests for entry/depart reconciliation

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::StreamExt;
use tempfile::TempDir;

use common::ScriptedStore;

use access_ledger::directory::DirectorySeed;
use access_ledger::{
    AccessLedger, DirectoryError, EventStore, EventStoreConfig, InMemoryDirectory, LedgerError,
    MemoryEventStore, NewRegister, OccupancyQuery, Person, PersonCategory, PersonDirectory,
    RegisterKind, Scope, Sector,
};

fn directory() -> Arc<InMemoryDirectory> {
    Arc::new(InMemoryDirectory::from_seed(DirectorySeed {
        companies: Vec::new(),
        sectors: vec![Sector::new("S1", "acme"), Sector::new("S2", "acme")],
        persons: vec![
            Person::new("A", PersonCategory::Staff).with_rut("12345678-9"),
            Person::new("B", PersonCategory::Contractor).with_rut("98765432-1"),
        ],
    }))
}

fn ledger_with(store: Arc<MemoryEventStore>) -> AccessLedger {
    let directory = directory();
    AccessLedger::new(store, directory.clone(), directory)
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, hour, 0, 0).unwrap()
}

#[tokio::test]
async fn test_entry_and_depart_same_day() {
    let store = Arc::new(MemoryEventStore::new());
    let ledger = ledger_with(store.clone());

    let entry = ledger.submit(NewRegister::entry("A", "S1").at(at(9))).await.unwrap();
    let depart = ledger.submit(NewRegister::depart("A", "S1").at(at(17))).await.unwrap();

    assert!(depart.resolved);
    assert_eq!(depart.counterpart_id, Some(entry.id));
    let entry = store.find_by_id(entry.id).await.unwrap().unwrap();
    assert!(entry.resolved);
    assert_eq!(entry.counterpart_id, Some(depart.id));

    let inside: Vec<_> = ledger
        .currently_inside(&OccupancyQuery::new(Scope::sector("S1")))
        .await
        .unwrap()
        .collect()
        .await;
    assert!(inside.is_empty());
}

#[tokio::test]
async fn test_depart_without_entry_is_stored_unmatched() {
    let ledger = ledger_with(Arc::new(MemoryEventStore::new()));

    let depart = ledger.submit(NewRegister::depart("B", "S1")).await.unwrap();

    assert_eq!(depart.kind, RegisterKind::Depart);
    assert!(!depart.resolved);
    assert!(!depart.unauthorized);
    assert_eq!(depart.counterpart_id, None);
}

#[tokio::test]
async fn test_unknown_person_is_never_matched() {
    let ledger = ledger_with(Arc::new(MemoryEventStore::new()));

    let entry = ledger.submit(NewRegister::entry("Z", "S1").at(at(8))).await.unwrap();
    let depart = ledger.submit(NewRegister::depart("Z", "S1").at(at(9))).await.unwrap();

    for register in [&entry, &depart] {
        assert!(register.unauthorized);
        assert!(!register.resolved);
        assert_eq!(register.person_id, None);
        assert_eq!(register.person_category, None);
        assert_eq!(register.unauthorized_identifier.as_deref(), Some("Z"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_departs_claim_one_entry() {
    let store = Arc::new(MemoryEventStore::new());
    let ledger = Arc::new(ledger_with(store.clone()));
    let entry = ledger.submit(NewRegister::entry("A", "S1").at(at(9))).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger
                .submit(NewRegister::depart("A", "S1").at(at(10) + Duration::seconds(i)))
                .await
        }));
    }

    let mut matched = Vec::new();
    for handle in handles {
        let depart = handle.await.unwrap().unwrap();
        if depart.resolved {
            matched.push(depart);
        }
    }

    assert_eq!(matched.len(), 1);
    let entry = store.find_by_id(entry.id).await.unwrap().unwrap();
    assert_eq!(entry.counterpart_id, Some(matched[0].id));
    assert_eq!(store.len(), 17);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_explicit_departs_one_wins() {
    let store = Arc::new(MemoryEventStore::new());
    let ledger = Arc::new(ledger_with(store.clone()));
    let entry = ledger.submit(NewRegister::entry("A", "S1").at(at(9))).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ledger = ledger.clone();
        let entry_id = entry.id;
        handles.push(tokio::spawn(async move {
            ledger
                .submit(NewRegister::depart("A", "S1").at(at(10)).counterpart(entry_id))
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(depart) => {
                assert!(depart.resolved);
                winners += 1;
            }
            // Losers either lost the CAS or saw the entry already resolved
            Err(LedgerError::Conflict(_)) | Err(LedgerError::Validation(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_explicit_counterpart_rejections() {
    let ledger = ledger_with(Arc::new(MemoryEventStore::new()));

    let entry = ledger.submit(NewRegister::entry("A", "S1").at(at(9))).await.unwrap();
    let stray = ledger.submit(NewRegister::depart("B", "S1").at(at(9))).await.unwrap();

    // Not an entry
    let err = ledger
        .submit(NewRegister::depart("B", "S1").at(at(10)).counterpart(stray.id))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    // Already resolved
    ledger
        .submit(NewRegister::depart("A", "S1").at(at(10)).counterpart(entry.id))
        .await
        .unwrap();
    let err = ledger
        .submit(NewRegister::depart("A", "S1").at(at(11)).counterpart(entry.id))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    // Unknown person naming a counterpart
    let err = ledger
        .submit(NewRegister::depart("Z", "S1").at(at(11)).counterpart(entry.id))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn test_failed_match_write_leaves_both_sides_open() {
    let store = Arc::new(ScriptedStore::new());
    let directory = directory();
    let ledger = AccessLedger::new(store.clone(), directory.clone(), directory);

    let entry = ledger.submit(NewRegister::entry("A", "S1").at(at(9))).await.unwrap();

    store.fail_match.store(true, Ordering::SeqCst);
    let err = ledger
        .submit(NewRegister::depart("A", "S1").at(at(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Storage(_)));

    let stored_entry = store.inner.find_by_id(entry.id).await.unwrap().unwrap();
    assert!(!stored_entry.resolved);
    assert_eq!(stored_entry.counterpart_id, None);
    let stored_depart = store.inner.find_by_id(entry.id + 1).await.unwrap().unwrap();
    assert_eq!(stored_depart.kind, RegisterKind::Depart);
    assert!(!stored_depart.resolved);
    assert_eq!(stored_depart.counterpart_id, None);

    // The entry is still open, so a later depart can claim it
    store.fail_match.store(false, Ordering::SeqCst);
    let retry = ledger.submit(NewRegister::depart("A", "S1").at(at(11))).await.unwrap();
    assert!(retry.resolved);
    assert_eq!(retry.counterpart_id, Some(entry.id));
}

#[tokio::test]
async fn test_explicit_counterpart_claimed_after_check_is_conflict() {
    let store = Arc::new(ScriptedStore::new());
    let directory = directory();
    let ledger = AccessLedger::new(store.clone(), directory.clone(), directory);

    let entry = ledger.submit(NewRegister::entry("A", "S1").at(at(9))).await.unwrap();
    let first = ledger.submit(NewRegister::depart("A", "S1").at(at(10))).await.unwrap();
    assert_eq!(first.counterpart_id, Some(entry.id));

    // The counterpart check reads the entry as open; the pair write then loses
    store.stale_reads.store(true, Ordering::SeqCst);
    let err = ledger
        .submit(NewRegister::depart("A", "S1").at(at(11)).counterpart(entry.id))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));

    let loser = store.inner.find_by_id(first.id + 1).await.unwrap().unwrap();
    assert_eq!(loser.kind, RegisterKind::Depart);
    assert!(!loser.resolved);
    assert_eq!(loser.counterpart_id, None);

    let stored_entry = store.inner.find_by_id(entry.id).await.unwrap().unwrap();
    assert_eq!(stored_entry.counterpart_id, Some(first.id));
}

/// Directory that is always down
struct DownDirectory {
    calls: AtomicUsize,
}

#[async_trait]
impl PersonDirectory for DownDirectory {
    async fn lookup(&self, _person_id: &str) -> Result<Person, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DirectoryError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_directory_outage_is_not_unauthorized() {
    let store = Arc::new(MemoryEventStore::new());
    let persons = Arc::new(DownDirectory {
        calls: AtomicUsize::new(0),
    });
    let ledger = AccessLedger::new(store.clone(), persons.clone(), directory());

    let err = ledger.submit(NewRegister::entry("A", "S1")).await.unwrap_err();

    assert!(matches!(err, LedgerError::DirectoryUnavailable(_)));
    assert_eq!(persons.calls.load(Ordering::SeqCst), 1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_journal_replay_restores_matches_and_snapshots() {
    let dir = TempDir::new().unwrap();
    let config = EventStoreConfig::new(dir.path());

    let (entry_id, depart_id) = {
        let store = Arc::new(MemoryEventStore::open(&config).unwrap());
        let directory = directory();
        let ledger = AccessLedger::new(store, directory.clone(), directory.clone());

        let entry = ledger.submit(NewRegister::entry("B", "S2").at(at(6))).await.unwrap();
        let depart = ledger.submit(NewRegister::depart("B", "S2").at(at(14))).await.unwrap();
        ledger.submit(NewRegister::entry("A", "S1").at(at(7))).await.unwrap();

        directory.upsert_person(Person::new("B", PersonCategory::Visitor).with_rut("98765432-1"));
        let report = ledger.sync_directory().await.unwrap();
        assert_eq!(report.updated, 2);

        (entry.id, depart.id)
    };

    let store = MemoryEventStore::open(&config).unwrap();
    assert_eq!(store.len(), 3);

    let entry = store.find_by_id(entry_id).await.unwrap().unwrap();
    assert!(entry.resolved);
    assert_eq!(entry.counterpart_id, Some(depart_id));
    assert_eq!(entry.person_category, Some(PersonCategory::Visitor));

    // Ids continue after the replayed maximum
    let next = store
        .insert(access_ledger::Register::unauthorized(
            RegisterKind::Entry,
            "Q".to_string(),
            "S1".to_string(),
            at(8),
        ))
        .await
        .unwrap();
    assert_eq!(next, 4);
}
