//! Access Ledger
//!
//! Reconciles the entry and depart registers of people moving through
//! facility sectors, and answers occupancy and traffic questions over them.
//!
//! # Features
//!
//! - **Matching**: every depart is linked to the most recent open entry of
//!   the same person, claimed with a compare-and-swap so racing departs
//!   never share an entry
//! - **Unauthorized registers**: unknown identifiers are kept but never matched
//! - **Occupancy**: who is inside now, by company, sector, category or rut
//! - **Statistics**: head counts plus a seven-day entry/depart history
//! - **Durable log**: append-only JSONL journal replayed on start-up
//!
//! # Modules
//!
//! - `types`: Core data structures (Register, Person, Scope, StatsResult)
//! - `event_store`: Storage port and the journaled in-memory store
//! - `directory`: Person directory and sector catalog ports
//! - `notify`: Register notices and the broadcast notifier
//! - `ledger`: The reconciliation engine and its queries
//! - `api`: REST endpoints (axum)
//! - `config`: Environment configuration
//! - `utils`: Day-bucket and timestamp helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use access_ledger::{AccessLedger, InMemoryDirectory, MemoryEventStore, NewRegister};
//!
//! # async fn run() -> Result<(), access_ledger::LedgerError> {
//! let directory = Arc::new(InMemoryDirectory::new());
//! let ledger = AccessLedger::new(
//!     Arc::new(MemoryEventStore::new()),
//!     directory.clone(),
//!     directory,
//! );
//! let depart = ledger.submit(NewRegister::depart("12345678-9", "gate-a")).await?;
//! println!("matched: {}", depart.resolved);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod event_store;
pub mod ledger;
pub mod notify;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::LedgerConfig;
pub use directory::{DirectoryError, InMemoryDirectory, PersonDirectory, SectorCatalog};
pub use error::{LedgerError, LedgerResult};
pub use event_store::{EventStore, EventStoreConfig, MemoryEventStore};
pub use ledger::AccessLedger;
pub use notify::{RegisterBroadcaster, RegisterNotice, RegisterNotifier};
pub use types::{
    AppResult, CategoryCounts, DailyBucket, MatchScope, NewRegister, OccupancyQuery, Person,
    PersonCategory, Register, RegisterId, RegisterKind, Scope, Sector, StatsResult, SyncReport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
