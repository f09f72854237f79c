//! Memory Event Store - reference implementation of the storage port
//!
//! Records live in a `BTreeMap` behind a `parking_lot::RwLock`. When a
//! journal is configured, each mutation is appended (and fsynced) before
//! it is applied in memory, all under the same write guard, so the journal
//! order always matches the in-memory order. A match is one journal line,
//! so replay never sees half of a pair.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::types::{PersonSnapshot, Register, RegisterId, RegisterKind};

use super::journal::{Journal, JournalEntry};
use super::{EventStore, RegisterFilter, SortOrder};

/// Threshold for using parallel filtering (record count)
const PARALLEL_SCAN_THRESHOLD: usize = 10_000;

/// Configuration for the MemoryEventStore
#[derive(Debug, Clone, Default)]
pub struct EventStoreConfig {
    /// Directory holding the journal; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
}

impl EventStoreConfig {
    /// Journaled store rooted at `data_dir`
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: Some(data_dir.as_ref().to_path_buf()),
        }
    }

    /// Purely in-memory store
    pub fn in_memory() -> Self {
        Self { data_dir: None }
    }

    /// Get path to registers.jsonl
    pub fn journal_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("registers.jsonl"))
    }
}

/// Result type for EventStore operations
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Errors that can occur in EventStore operations
#[derive(Debug)]
pub enum EventStoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidEntry(String),
}

impl std::fmt::Display for EventStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStoreError::Io(e) => write!(f, "IO error: {}", e),
            EventStoreError::Json(e) => write!(f, "JSON error: {}", e),
            EventStoreError::InvalidEntry(msg) => write!(f, "Invalid journal entry: {}", msg),
        }
    }
}

impl std::error::Error for EventStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EventStoreError::Io(e) => Some(e),
            EventStoreError::Json(e) => Some(e),
            EventStoreError::InvalidEntry(_) => None,
        }
    }
}

impl From<std::io::Error> for EventStoreError {
    fn from(e: std::io::Error) -> Self {
        EventStoreError::Io(e)
    }
}

impl From<serde_json::Error> for EventStoreError {
    fn from(e: serde_json::Error) -> Self {
        EventStoreError::Json(e)
    }
}

struct StoreState {
    records: BTreeMap<RegisterId, Register>,
    /// Next register ID to assign
    next_id: RegisterId,
}

/// In-memory register log with optional JSONL journal
pub struct MemoryEventStore {
    state: RwLock<StoreState>,
    journal: Option<Journal>,
}

impl MemoryEventStore {
    /// Create an empty, non-journaled store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                records: BTreeMap::new(),
                next_id: 1,
            }),
            journal: None,
        }
    }

    /// Open a store from config, replaying the journal if there is one
    pub fn open(config: &EventStoreConfig) -> EventStoreResult<Self> {
        let Some(path) = config.journal_path() else {
            return Ok(Self::new());
        };

        let journal = Journal::new(&path);
        let (records, max_id) = journal.replay()?;

        info!(
            path = %path.display(),
            records = records.len(),
            last_id = max_id,
            "replayed register journal"
        );

        Ok(Self {
            state: RwLock::new(StoreState {
                records,
                next_id: max_id + 1,
            }),
            journal: Some(journal),
        })
    }

    /// Number of stored registers
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Journal first, memory second: a failed append leaves memory untouched
    fn commit(&self, state: &mut StoreState, entry: JournalEntry) -> EventStoreResult<()> {
        if let Some(ref journal) = self.journal {
            journal.append(&entry)?;
        }
        Journal::apply(&mut state.records, entry)
    }

    fn filtered(records: &BTreeMap<RegisterId, Register>, filter: &RegisterFilter) -> Vec<Register> {
        if records.len() > PARALLEL_SCAN_THRESHOLD {
            let values: Vec<&Register> = records.values().collect();
            values
                .par_iter()
                .filter(|r| filter.matches(r))
                .map(|r| (*r).clone())
                .collect()
        } else {
            records
                .values()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect()
        }
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, mut register: Register) -> EventStoreResult<RegisterId> {
        let mut state = self.state.write();
        let id = state.next_id;
        register.id = id;

        self.commit(&mut state, JournalEntry::Inserted { register })?;
        state.next_id = id + 1;

        Ok(id)
    }

    async fn find_by_id(&self, id: RegisterId) -> EventStoreResult<Option<Register>> {
        Ok(self.state.read().records.get(&id).cloned())
    }

    async fn find_unresolved_entry(
        &self,
        person_id: &str,
        sector_id: Option<&str>,
        max_occurred_at: DateTime<Utc>,
    ) -> EventStoreResult<Option<Register>> {
        let state = self.state.read();
        let candidate = state
            .records
            .values()
            .filter(|r| {
                r.kind == RegisterKind::Entry
                    && !r.resolved
                    && !r.unauthorized
                    && r.person_id.as_deref() == Some(person_id)
                    && r.occurred_at <= max_occurred_at
                    && sector_id.map_or(true, |s| r.sector_id == s)
            })
            .max_by(|a, b| a.occurred_at.cmp(&b.occurred_at).then_with(|| a.id.cmp(&b.id)));

        Ok(candidate.cloned())
    }

    async fn conditional_resolve(
        &self,
        id: RegisterId,
        counterpart_id: RegisterId,
    ) -> EventStoreResult<bool> {
        let mut state = self.state.write();
        match state.records.get(&id) {
            Some(register) if !register.resolved => {}
            Some(_) => {
                debug!(id, "conditional resolve lost: already resolved");
                return Ok(false);
            }
            None => return Ok(false),
        }

        self.commit(&mut state, JournalEntry::Resolved { id, counterpart_id })?;
        Ok(true)
    }

    async fn resolve_pair(
        &self,
        entry_id: RegisterId,
        depart_id: RegisterId,
    ) -> EventStoreResult<bool> {
        let mut state = self.state.write();
        match state.records.get(&entry_id) {
            Some(entry) if entry.is_entry() && !entry.resolved => {}
            Some(_) => {
                debug!(entry_id, depart_id, "pair resolve lost: entry already resolved");
                return Ok(false);
            }
            None => return Ok(false),
        }
        match state.records.get(&depart_id) {
            Some(depart) if depart.is_depart() && !depart.resolved => {}
            _ => {
                return Err(EventStoreError::InvalidEntry(format!(
                    "register {} is not an open depart",
                    depart_id
                )));
            }
        }

        self.commit(
            &mut state,
            JournalEntry::Matched {
                entry: entry_id,
                depart: depart_id,
            },
        )?;
        Ok(true)
    }

    async fn query(
        &self,
        filter: &RegisterFilter,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> EventStoreResult<Vec<Register>> {
        let mut registers = {
            let state = self.state.read();
            Self::filtered(&state.records, filter)
        };

        sort.sort(&mut registers);
        if let Some(limit) = limit {
            registers.truncate(limit);
        }

        Ok(registers)
    }

    async fn refresh_person(
        &self,
        id: RegisterId,
        snapshot: PersonSnapshot,
    ) -> EventStoreResult<bool> {
        let mut state = self.state.write();
        match state.records.get(&id) {
            Some(register) if register.snapshot().as_ref() != Some(&snapshot) => {}
            _ => return Ok(false),
        }

        self.commit(&mut state, JournalEntry::PersonRefreshed { id, snapshot })?;
        Ok(true)
    }
}
