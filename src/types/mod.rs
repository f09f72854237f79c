//! Data types for the access ledger
//!
//! This module contains all the core data structures used throughout the application.

mod person;
mod register;
mod scope;
mod stats;

pub use person::{Company, Person, PersonCategory, Sector};
pub use register::{NewRegister, PersonSnapshot, Register, RegisterId, RegisterKind};
pub use scope::{MatchScope, OccupancyQuery, Scope};
pub use stats::{CategoryCounts, DailyBucket, StatsResult, SyncReport, HISTORY_DAYS};

/// Result type for process-level operations (start-up, configuration)
pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
