//! Errors returned by ledger operations

use crate::directory::DirectoryError;
use crate::event_store::EventStoreError;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur in ledger operations
#[derive(Debug)]
pub enum LedgerError {
    /// Malformed or inconsistent input
    Validation(String),
    /// A referenced register or sector does not exist
    NotFound(String),
    /// An explicitly requested counterpart was claimed by a concurrent depart
    Conflict(String),
    /// The event store failed; never retried internally
    Storage(EventStoreError),
    /// The person directory or sector catalog failed transiently
    DirectoryUnavailable(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LedgerError::NotFound(message.into())
    }

    /// Short machine-readable code, used by the REST layer
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::DirectoryUnavailable(_) => "DIRECTORY_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Validation(msg) => write!(f, "Validation error: {}", msg),
            LedgerError::NotFound(msg) => write!(f, "Not found: {}", msg),
            LedgerError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            LedgerError::Storage(e) => write!(f, "Storage error: {}", e),
            LedgerError::DirectoryUnavailable(msg) => write!(f, "Directory unavailable: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EventStoreError> for LedgerError {
    fn from(e: EventStoreError) -> Self {
        LedgerError::Storage(e)
    }
}

/// `submit` matches `NotFound` itself (it means "unauthorized" there);
/// everywhere else an unknown person is a plain not-found.
impl From<DirectoryError> for LedgerError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::NotFound(id) => LedgerError::NotFound(format!("person '{}'", id)),
            DirectoryError::Unavailable(msg) => LedgerError::DirectoryUnavailable(msg),
        }
    }
}
