//! Statistics endpoint

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{error_response, scope_from, ApiResponse};
use crate::api::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsParams {
    pub company: Option<String>,
    pub sector: Option<String>,
}

/// GET /api/statistics - Head counts by category and the last seven days
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatisticsParams>,
) -> Response {
    let scope = scope_from(&params.company, &params.sector);
    match state.ledger.compute_statistics(&scope, state.now()).await {
        Ok(stats) => Json(ApiResponse::new(stats, state.current_sequence_id())).into_response(),
        Err(e) => error_response(e),
    }
}
