//! Occupancy endpoint

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;

use super::{error_response, scope_from, ApiError, ApiResponse};
use crate::api::state::AppState;
use crate::types::{OccupancyQuery, PersonCategory, Register};

/// Query parameters for "who is inside"
#[derive(Debug, Default, Deserialize)]
pub struct OccupancyParams {
    pub company: Option<String>,
    pub sector: Option<String>,
    /// staff | contractor | visitor | supplier
    pub category: Option<String>,
    /// Case-insensitive rut (or person id) prefix
    pub rut: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/occupancy - Open entries in scope
pub async fn currently_inside(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OccupancyParams>,
) -> Response {
    let category = match params.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<PersonCategory>() {
            Ok(category) => Some(category),
            Err(msg) => return (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(msg))).into_response(),
        },
    };

    let query = OccupancyQuery {
        scope: scope_from(&params.company, &params.sector),
        category,
        rut: params.rut,
        limit: params.limit,
    };

    match state.ledger.currently_inside(&query).await {
        Ok(stream) => {
            let inside: Vec<Register> = stream.collect().await;
            let total = inside.len();
            Json(ApiResponse::with_total(inside, state.current_sequence_id(), total)).into_response()
        }
        Err(e) => error_response(e),
    }
}
