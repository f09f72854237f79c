//! Register endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{error_response, scope_from, ApiError, ApiResponse};
use crate::api::state::AppState;
use crate::types::{NewRegister, RegisterId};

/// Query parameters for listing registers
#[derive(Debug, Default, Deserialize)]
pub struct ListRegistersParams {
    pub company: Option<String>,
    pub sector: Option<String>,
    /// Keep only the `top` most recent registers
    pub top: Option<usize>,
}

/// POST /api/registers - Submit an entry or depart
pub async fn create_register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewRegister>, JsonRejection>,
) -> Response {
    let Json(candidate) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiError::bad_request(rejection.body_text())),
            )
                .into_response()
        }
    };

    match state.ledger.submit(candidate).await {
        Ok(register) => (
            StatusCode::CREATED,
            Json(ApiResponse::new(register, state.current_sequence_id())),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/registers/:id - Get single register
pub async fn get_register(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RegisterId>,
) -> Response {
    match state.ledger.register(id).await {
        Ok(register) => Json(ApiResponse::new(register, state.current_sequence_id())).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/registers - Registers in scope, most recent first
pub async fn list_registers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRegistersParams>,
) -> Response {
    let scope = scope_from(&params.company, &params.sector);
    match state.ledger.registers(&scope, params.top).await {
        Ok(registers) => {
            let total = registers.len();
            Json(ApiResponse::with_total(registers, state.current_sequence_id(), total)).into_response()
        }
        Err(e) => error_response(e),
    }
}
