//! Access Ledger - reconciliation engine
//!
//! `AccessLedger` wires the storage and directory ports together and exposes
//! the ledger operations. Each operation lives in its own submodule:
//!
//! - `reconcile`: submit an entry/depart and link counterparts
//! - `occupancy`: who is inside now
//! - `statistics`: head counts and the seven-day history
//! - `sync`: bulk refresh of person snapshots
//! - `listing`: plain register lookups

mod listing;
mod occupancy;
mod reconcile;
mod statistics;
mod sync;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use futures::stream::BoxStream;

use crate::directory::{PersonDirectory, SectorCatalog};
use crate::error::{LedgerError, LedgerResult};
use crate::event_store::EventStore;
use crate::notify::{NoopNotifier, RegisterNotice, RegisterNotifier};
use crate::types::{
    MatchScope, NewRegister, OccupancyQuery, Register, RegisterId, Scope, StatsResult, SyncReport,
};

/// The reconciliation engine and its read-side queries
pub struct AccessLedger {
    pub(crate) store: Arc<dyn EventStore>,
    pub(crate) persons: Arc<dyn PersonDirectory>,
    pub(crate) sectors: Arc<dyn SectorCatalog>,
    pub(crate) notifier: Arc<dyn RegisterNotifier>,
    pub(crate) match_scope: MatchScope,
}

impl AccessLedger {
    /// Create a ledger with per-person matching and no notifications
    pub fn new(
        store: Arc<dyn EventStore>,
        persons: Arc<dyn PersonDirectory>,
        sectors: Arc<dyn SectorCatalog>,
    ) -> Self {
        Self {
            store,
            persons,
            sectors,
            notifier: Arc::new(NoopNotifier),
            match_scope: MatchScope::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn RegisterNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_match_scope(mut self, match_scope: MatchScope) -> Self {
        self.match_scope = match_scope;
        self
    }

    pub fn match_scope(&self) -> MatchScope {
        self.match_scope
    }

    pub(crate) fn notify(&self, notice: RegisterNotice) {
        self.notifier.notify(notice);
    }

    /// Expand a scope to the sector ids it covers.
    ///
    /// `None` means unbounded. A sector outside the requested company yields
    /// an empty list rather than an error.
    pub(crate) async fn resolve_sectors(&self, scope: &Scope) -> LedgerResult<Option<Vec<String>>> {
        match (&scope.company_id, &scope.sector_id) {
            (None, None) => Ok(None),
            (company, Some(sector_id)) => {
                let sector = self
                    .sectors
                    .sector(sector_id)
                    .await?
                    .ok_or_else(|| LedgerError::not_found(format!("sector '{}'", sector_id)))?;
                match company {
                    Some(company_id) if sector.company_id.as_ref() != Some(company_id) => {
                        Ok(Some(Vec::new()))
                    }
                    _ => Ok(Some(vec![sector.id])),
                }
            }
            (Some(company_id), None) => Ok(Some(self.sectors.sectors_of_company(company_id).await?)),
        }
    }
}

// Operations (implemented in submodules)
impl AccessLedger {
    /// Store an entry or depart, matching a depart with its open entry
    pub async fn submit(&self, candidate: NewRegister) -> LedgerResult<Register> {
        reconcile::submit(self, candidate).await
    }

    /// Unresolved, authorized entries in scope, ascending by id
    pub async fn currently_inside(
        &self,
        query: &OccupancyQuery,
    ) -> LedgerResult<BoxStream<'static, Register>> {
        occupancy::currently_inside(self, query).await
    }

    /// Category head counts and the seven-day history for `scope`
    pub async fn compute_statistics(
        &self,
        scope: &Scope,
        now: DateTime<FixedOffset>,
    ) -> LedgerResult<StatsResult> {
        statistics::compute_statistics(self, scope, now).await
    }

    /// Refresh person snapshots on stored registers from the directory
    pub async fn sync_directory(&self) -> LedgerResult<SyncReport> {
        sync::sync_directory(self).await
    }

    pub async fn register(&self, id: RegisterId) -> LedgerResult<Register> {
        listing::register(self, id).await
    }

    /// Registers in scope, most recent first
    pub async fn registers(&self, scope: &Scope, limit: Option<usize>) -> LedgerResult<Vec<Register>> {
        listing::registers(self, scope, limit).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::directory::{DirectorySeed, InMemoryDirectory};
    use crate::event_store::MemoryEventStore;
    use crate::types::{Person, PersonCategory, Sector};

    /// Two companies: c-1 owns s-1 and s-2, c-2 owns s-3.
    pub fn directory() -> Arc<InMemoryDirectory> {
        Arc::new(InMemoryDirectory::from_seed(DirectorySeed {
            companies: Vec::new(),
            sectors: vec![
                Sector::new("s-1", "c-1"),
                Sector::new("s-2", "c-1"),
                Sector::new("s-3", "c-2"),
            ],
            persons: vec![
                Person::new("ana", PersonCategory::Staff).with_rut("11111111-1"),
                Person::new("beto", PersonCategory::Contractor).with_rut("22222222-2"),
                Person::new("carla", PersonCategory::Visitor).with_rut("33333333-3"),
                Person::new("dario", PersonCategory::Supplier).with_rut("44444444-4"),
            ],
        }))
    }

    pub fn ledger() -> (AccessLedger, Arc<MemoryEventStore>, Arc<InMemoryDirectory>) {
        let store = Arc::new(MemoryEventStore::new());
        let directory = directory();
        let ledger = AccessLedger::new(store.clone(), directory.clone(), directory.clone());
        (ledger, store, directory)
    }
}
