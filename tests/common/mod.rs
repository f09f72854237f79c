//! Store double shared by the integration tests
//!
//! Wraps a `MemoryEventStore` and injects specific failures.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use access_ledger::event_store::{EventStoreError, EventStoreResult, RegisterFilter, SortOrder};
use access_ledger::types::PersonSnapshot;
use access_ledger::{EventStore, MemoryEventStore, Register, RegisterId};

#[derive(Default)]
pub struct ScriptedStore {
    pub inner: Arc<MemoryEventStore>,
    /// `resolve_pair` fails with an I/O error
    pub fail_match: AtomicBool,
    /// `find_by_id` reports every register as still unresolved
    pub stale_reads: AtomicBool,
    /// `query` fails for time-windowed filters
    pub fail_history: AtomicBool,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn disk_full() -> EventStoreError {
    EventStoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
}

#[async_trait]
impl EventStore for ScriptedStore {
    async fn insert(&self, register: Register) -> EventStoreResult<RegisterId> {
        self.inner.insert(register).await
    }

    async fn find_by_id(&self, id: RegisterId) -> EventStoreResult<Option<Register>> {
        let found = self.inner.find_by_id(id).await?;
        if !self.stale_reads.load(Ordering::SeqCst) {
            return Ok(found);
        }
        Ok(found.map(|mut register| {
            register.resolved = false;
            register.counterpart_id = None;
            register
        }))
    }

    async fn find_unresolved_entry(
        &self,
        person_id: &str,
        sector_id: Option<&str>,
        max_occurred_at: DateTime<Utc>,
    ) -> EventStoreResult<Option<Register>> {
        self.inner
            .find_unresolved_entry(person_id, sector_id, max_occurred_at)
            .await
    }

    async fn conditional_resolve(
        &self,
        id: RegisterId,
        counterpart_id: RegisterId,
    ) -> EventStoreResult<bool> {
        self.inner.conditional_resolve(id, counterpart_id).await
    }

    async fn resolve_pair(
        &self,
        entry_id: RegisterId,
        depart_id: RegisterId,
    ) -> EventStoreResult<bool> {
        if self.fail_match.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.resolve_pair(entry_id, depart_id).await
    }

    async fn query(
        &self,
        filter: &RegisterFilter,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> EventStoreResult<Vec<Register>> {
        if self.fail_history.load(Ordering::SeqCst) && filter.occurred_from.is_some() {
            return Err(disk_full());
        }
        self.inner.query(filter, sort, limit).await
    }

    async fn refresh_person(
        &self,
        id: RegisterId,
        snapshot: PersonSnapshot,
    ) -> EventStoreResult<bool> {
        self.inner.refresh_person(id, snapshot).await
    }
}
