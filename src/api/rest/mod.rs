//! REST API module for HTTP endpoints
//!
//! - `POST /api/registers` - Submit an entry or depart
//! - `GET /api/registers` - List registers, most recent first
//! - `GET /api/registers/:id` - Get single register
//! - `GET /api/occupancy` - Who is inside now
//! - `GET /api/statistics` - Head counts and daily history
//! - `POST /api/directory/sync` - Refresh person snapshots

pub mod directory;
pub mod occupancy;
pub mod registers;
pub mod statistics;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::LedgerError;
use crate::types::Scope;

/// Build a scope from the `company` / `sector` query parameters.
/// Blank values are treated as absent.
pub fn scope_from(company: &Option<String>, sector: &Option<String>) -> Scope {
    let clean = |v: &Option<String>| {
        v.as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    Scope {
        company_id: clean(company),
        sector_id: clean(sector),
    }
}

/// Standard API response wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Notice sequence id at the time of the response
    pub sequence_id: u64,
    /// Total count (for list responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, sequence_id: u64) -> Self {
        Self {
            data,
            sequence_id,
            total: None,
        }
    }

    pub fn with_total(data: T, sequence_id: u64, total: usize) -> Self {
        Self {
            data,
            sequence_id,
            total: Some(total),
        }
    }
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn status_of(err: &LedgerError) -> StatusCode {
        match err {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Conflict(_) => StatusCode::CONFLICT,
            LedgerError::DirectoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "BAD_REQUEST".to_string(),
        }
    }
}

impl From<&LedgerError> for ApiError {
    fn from(err: &LedgerError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

/// Map a ledger error to its status code and JSON body
pub fn error_response(err: LedgerError) -> Response {
    let status = ApiError::status_of(&err);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        debug!(error = %err, "request rejected");
    }
    (status, Json(ApiError::from(&err))).into_response()
}
