//! Person and sector directory ports
//!
//! The engine only needs two answers from the outside world: who a person
//! identifier belongs to, and which sectors exist (and which company owns
//! them). Both are async ports so a remote directory can back them.

mod memory;

use async_trait::async_trait;

use crate::types::{Person, Sector};

pub use memory::{DirectorySeed, InMemoryDirectory};

/// Errors from directory lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Definitive answer: the identifier is not known
    NotFound(String),
    /// The directory could not be reached or answered with an error
    Unavailable(String),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::NotFound(id) => write!(f, "Unknown person '{}'", id),
            DirectoryError::Unavailable(msg) => write!(f, "Directory unavailable: {}", msg),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Resolves person identifiers
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    async fn lookup(&self, person_id: &str) -> Result<Person, DirectoryError>;
}

/// Resolves sectors and company membership
#[async_trait]
pub trait SectorCatalog: Send + Sync {
    async fn sector(&self, sector_id: &str) -> Result<Option<Sector>, DirectoryError>;

    async fn sectors_of_company(&self, company_id: &str) -> Result<Vec<String>, DirectoryError>;
}
