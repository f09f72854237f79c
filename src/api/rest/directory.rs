//! Directory maintenance endpoint

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use super::{error_response, ApiResponse};
use crate::api::state::AppState;

/// POST /api/directory/sync - Refresh person snapshots on stored registers
pub async fn sync_directory(State(state): State<Arc<AppState>>) -> Response {
    match state.ledger.sync_directory().await {
        Ok(report) => Json(ApiResponse::new(report, state.current_sequence_id())).into_response(),
        Err(e) => error_response(e),
    }
}
