//! Integration tests for Health endpoints
//!
//! Tests the liveness and readiness health check endpoints.

use std::sync::Arc;

use actix_web::{http::StatusCode, test, App};
use serde_json::Value;

use roomwarden::routes;

use crate::common::{test_app_state, InstrumentedStore, TestDb};

// =============================================================================
// Liveness Endpoint Tests
// =============================================================================

#[actix_web::test]
async fn test_liveness_returns_ok_without_token() {
    let store = Arc::new(InstrumentedStore::new());

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(store))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("application/json"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

// =============================================================================
// Readiness Endpoint Tests
// =============================================================================

#[actix_web::test]
async fn test_readiness_with_healthy_store() {
    let store = Arc::new(InstrumentedStore::new());

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(store))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"], "ok");
}

#[actix_web::test]
async fn test_readiness_returns_503_when_store_is_down() {
    let store = Arc::new(InstrumentedStore::new());
    store.set_unhealthy();

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(store))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["checks"]["store"], "error");
}

#[actix_web::test]
async fn test_readiness_with_postgres() {
    let db = TestDb::new().await;

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(Arc::new(db.store())))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["checks"]["store"], "ok");
}
