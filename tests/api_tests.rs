//! Router tests driving the REST endpoints end to end

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{FixedOffset, Offset, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use access_ledger::api::{create_router, AppState};
use access_ledger::directory::DirectorySeed;
use access_ledger::{
    AccessLedger, InMemoryDirectory, MemoryEventStore, Person, PersonCategory, RegisterBroadcaster,
    Sector,
};

fn app() -> Router {
    let directory = Arc::new(InMemoryDirectory::from_seed(DirectorySeed {
        companies: Vec::new(),
        sectors: vec![Sector::new("S1", "acme"), Sector::new("S2", "acme")],
        persons: vec![
            Person::new("A", PersonCategory::Staff).with_rut("12345678-9"),
            Person::new("B", PersonCategory::Visitor).with_rut("98765432-1"),
        ],
    }));
    let broadcaster = Arc::new(RegisterBroadcaster::new(64));
    let ledger = AccessLedger::new(
        Arc::new(MemoryEventStore::new()),
        directory.clone(),
        directory,
    )
    .with_notifier(broadcaster.clone());
    let offset: FixedOffset = Utc.fix();
    create_router(Arc::new(AppState::new(Arc::new(ledger), broadcaster, offset)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_submit_and_match_over_http() {
    let app = app();

    let (status, body) = send(
        &app,
        post(
            "/api/registers",
            json!({"kind": "entry", "personId": "A", "sectorId": "S1", "occurredAt": "2024-07-01T09:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["personCategory"], "staff");
    assert_eq!(body["data"]["resolved"], false);
    let entry_id = body["data"]["id"].as_u64().unwrap();

    let (status, body) = send(
        &app,
        post(
            "/api/registers",
            json!({"kind": "depart", "personId": "A", "sectorId": "S1", "occurredAt": "2024-07-01T17:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["resolved"], true);
    assert_eq!(body["data"]["counterpartId"], entry_id);
    // created (entry), created + resolved (depart)
    assert_eq!(body["sequenceId"], 3);

    let (status, body) = send(&app, get(&format!("/api/registers/{}", entry_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resolved"], true);
}

#[tokio::test]
async fn test_error_status_codes() {
    let app = app();

    let (status, body) = send(&app, post("/api/registers", json!({"personId": "A", "sectorId": "S1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        post("/api/registers", json!({"kind": "entry", "personId": "A", "sectorId": "S9"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&app, get("/api/registers/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, post("/api/registers", json!({"kind": "sideways"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = send(&app, get("/api/occupancy?category=janitor")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_occupancy_listing_and_statistics() {
    let app = app();

    for (kind, person, sector) in [("entry", "A", "S1"), ("entry", "B", "S2"), ("entry", "X", "S2")] {
        let (status, _) = send(
            &app,
            post("/api/registers", json!({"kind": kind, "personId": person, "sectorId": sector})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get("/api/occupancy?company=acme&category=visitor")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["personId"], "B");

    let (status, body) = send(&app, get("/api/registers?sector=S2&top=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, body) = send(&app, get("/api/statistics?company=acme")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["inside"]["staff"], 1);
    assert_eq!(body["data"]["inside"]["visitor"], 1);
    assert_eq!(body["data"]["dailyHistory"].as_array().unwrap().len(), 7);

    let (status, body) = send(&app, post("/api/directory/sync", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["scanned"], 2);
    assert_eq!(body["data"]["updated"], 0);
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
