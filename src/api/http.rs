//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::rest::{directory, occupancy, registers, statistics};
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // REST API endpoints
        .route(
            "/api/registers",
            get(registers::list_registers).post(registers::create_register),
        )
        .route("/api/registers/:id", get(registers::get_register))
        .route("/api/occupancy", get(occupancy::currently_inside))
        .route("/api/statistics", get(statistics::get_statistics))
        .route("/api/directory/sync", post(directory::sync_directory))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::event_store::MemoryEventStore;
    use crate::ledger::AccessLedger;
    use crate::notify::RegisterBroadcaster;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{FixedOffset, Offset, Utc};
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let directory = Arc::new(InMemoryDirectory::new());
        let ledger = AccessLedger::new(
            Arc::new(MemoryEventStore::new()),
            directory.clone(),
            directory,
        );
        let offset: FixedOffset = Utc.fix();
        let state = Arc::new(AppState::new(
            Arc::new(ledger),
            Arc::new(RegisterBroadcaster::new(16)),
            offset,
        ));
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }
}
