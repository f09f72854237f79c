//! Event Store Module
//!
//! The register log is the only shared mutable resource of the ledger.
//! This module defines the storage port the engine is written against and a
//! reference implementation:
//! - `EventStore`: async port (insert, lookup, filtered query, CAS resolve, pair link)
//! - `MemoryEventStore`: in-memory log with an optional JSONL journal
//! - `Journal`: append-only journal file and replay
//!
//! # Write Path
//!
//! ```text
//! ┌──────────┐    ┌────────────────┐    ┌────────────────────┐
//! │ submit() │───►│ journal append │───►│ apply to in-memory │
//! │          │    │ (fsync)        │    │ record map         │
//! └──────────┘    └────────────────┘    └────────────────────┘
//! ```
//!
//! Read path on start-up: replay `registers.jsonl` in order.

mod journal;
mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{PersonCategory, PersonSnapshot, Register, RegisterId, RegisterKind};

pub use journal::{Journal, JournalEntry};
pub use store::{EventStoreConfig, EventStoreError, EventStoreResult, MemoryEventStore};

/// Filter for `EventStore::query`. Unset fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct RegisterFilter {
    pub kind: Option<RegisterKind>,
    pub resolved: Option<bool>,
    /// `false` drops unauthorized registers
    pub include_unauthorized: bool,
    /// Restrict to these sectors (an empty list matches nothing)
    pub sector_ids: Option<Vec<String>>,
    pub person_id: Option<String>,
    pub category: Option<PersonCategory>,
    /// Case-insensitive prefix of rut or person id
    pub identifier_prefix: Option<String>,
    /// Inclusive lower bound on `occurred_at`
    pub occurred_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `occurred_at`
    pub occurred_before: Option<DateTime<Utc>>,
}

impl RegisterFilter {
    /// Does `register` satisfy every set field?
    pub fn matches(&self, register: &Register) -> bool {
        if let Some(kind) = self.kind {
            if register.kind != kind {
                return false;
            }
        }
        if let Some(resolved) = self.resolved {
            if register.resolved != resolved {
                return false;
            }
        }
        if !self.include_unauthorized && register.unauthorized {
            return false;
        }
        if let Some(ref sectors) = self.sector_ids {
            if !sectors.iter().any(|s| s == &register.sector_id) {
                return false;
            }
        }
        if let Some(ref person_id) = self.person_id {
            if register.person_id.as_ref() != Some(person_id) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if register.person_category != Some(category) {
                return false;
            }
        }
        if let Some(ref prefix) = self.identifier_prefix {
            if !register.identifier_starts_with(prefix) {
                return false;
            }
        }
        if let Some(from) = self.occurred_from {
            if register.occurred_at < from {
                return false;
            }
        }
        if let Some(before) = self.occurred_before {
            if register.occurred_at >= before {
                return false;
            }
        }
        true
    }
}

/// Result ordering for `EventStore::query`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending id (insertion order)
    #[default]
    IdAsc,
    /// Most recent first: `occurred_at` desc, then id desc
    OccurredDesc,
}

impl SortOrder {
    pub fn sort(&self, registers: &mut [Register]) {
        match self {
            SortOrder::IdAsc => registers.sort_by_key(|r| r.id),
            SortOrder::OccurredDesc => registers.sort_by(|a, b| {
                b.occurred_at
                    .cmp(&a.occurred_at)
                    .then_with(|| b.id.cmp(&a.id))
            }),
        }
    }
}

/// Durable, queryable register log
///
/// Implementations must make `conditional_resolve` and `resolve_pair`
/// atomic with respect to concurrent callers: at most one caller may flip a
/// given register from unresolved to resolved, and a pair is never left
/// half-linked.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a new register, assigning and returning its id.
    /// The incoming `id` field is ignored.
    async fn insert(&self, register: Register) -> EventStoreResult<RegisterId>;

    async fn find_by_id(&self, id: RegisterId) -> EventStoreResult<Option<Register>>;

    /// Most recent unresolved, authorized entry of `person_id` with
    /// `occurred_at <= max_occurred_at`, optionally restricted to a sector.
    /// Ties on `occurred_at` go to the highest id.
    async fn find_unresolved_entry(
        &self,
        person_id: &str,
        sector_id: Option<&str>,
        max_occurred_at: DateTime<Utc>,
    ) -> EventStoreResult<Option<Register>>;

    /// Set `resolved = true` and `counterpart_id` on `id` only if it is
    /// still unresolved. Returns whether this call performed the update;
    /// `false` also covers a missing id.
    async fn conditional_resolve(
        &self,
        id: RegisterId,
        counterpart_id: RegisterId,
    ) -> EventStoreResult<bool>;

    /// Link an entry and its depart in one atomic step: CAS the entry on
    /// `resolved = false`, then mark both sides resolved with mutual
    /// counterpart ids. Returns `false`, changing nothing, when the entry is
    /// missing or already resolved. A missing, non-depart or already
    /// resolved depart is an error and also changes nothing.
    async fn resolve_pair(
        &self,
        entry_id: RegisterId,
        depart_id: RegisterId,
    ) -> EventStoreResult<bool>;

    async fn query(
        &self,
        filter: &RegisterFilter,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> EventStoreResult<Vec<Register>>;

    /// Rewrite the person snapshot of `id`. Returns `false` when the
    /// register is missing or already carries this snapshot.
    async fn refresh_person(
        &self,
        id: RegisterId,
        snapshot: PersonSnapshot,
    ) -> EventStoreResult<bool>;
}
