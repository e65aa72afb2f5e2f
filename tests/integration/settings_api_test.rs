//! Integration tests for the Settings API

use std::sync::Arc;

use actix_web::{http::StatusCode, test, App};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use roomwarden::models::HostelSettings;
use roomwarden::routes;
use roomwarden::store::{AllocationStore, MemoryStore};

use crate::common::{test_app_state, TEST_TOKEN};

fn bearer() -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", TEST_TOKEN))
}

#[actix_web::test]
async fn test_get_settings_returns_defaults_when_unset() {
    let store = Arc::new(MemoryStore::new());

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(store))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/settings")
        .insert_header(bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "paymentGracePeriod": 168,
            "autoRevokeUnpaidAllocations": true,
            "maxRoomCapacity": 4,
            "allowMixedGender": false
        })
    );
}

#[actix_web::test]
async fn test_update_settings_takes_effect_immediately() {
    let store = Arc::new(MemoryStore::new());

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(store.clone()))
            .configure(routes::configure),
    )
    .await;

    let before: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/settings")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(before["autoRevokeUnpaidAllocations"], true);

    let req = test::TestRequest::put()
        .uri("/api/settings")
        .insert_header(bearer())
        .set_json(json!({
            "paymentGracePeriod": 48,
            "autoRevokeUnpaidAllocations": false,
            "maxRoomCapacity": 2,
            "allowMixedGender": true
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let after: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/settings")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(after["paymentGracePeriod"], 48);
    assert_eq!(after["autoRevokeUnpaidAllocations"], false);

    // The sweep sees the new value without a restart
    let sweep: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/check-payment-deadlines")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(sweep["message"], "Auto-revoke is disabled");

    let stored = store.get_settings().await.unwrap().unwrap();
    assert_eq!(
        stored,
        HostelSettings {
            payment_grace_period: 48,
            auto_revoke_unpaid_allocations: false,
            max_room_capacity: 2,
            allow_mixed_gender: true,
        }
    );
}

#[actix_web::test]
async fn test_partial_update_keeps_other_fields() {
    let store = Arc::new(MemoryStore::new());
    store
        .save_settings(&HostelSettings {
            auto_revoke_unpaid_allocations: false,
            max_room_capacity: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(store.clone()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/settings")
        .insert_header(bearer())
        .set_json(json!({ "paymentGracePeriod": 48 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "paymentGracePeriod": 48,
            "autoRevokeUnpaidAllocations": false,
            "maxRoomCapacity": 2,
            "allowMixedGender": false
        })
    );
    assert_eq!(
        store.get_settings().await.unwrap().unwrap().payment_grace_period,
        48
    );
}

#[actix_web::test]
async fn test_update_settings_rejects_negative_grace() {
    let store = Arc::new(MemoryStore::new());

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(store.clone()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/settings")
        .insert_header(bearer())
        .set_json(json!({
            "paymentGracePeriod": -1,
            "autoRevokeUnpaidAllocations": true,
            "maxRoomCapacity": 4,
            "allowMixedGender": false
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "ValidationError");
    assert!(store.get_settings().await.unwrap().is_none());
}

#[actix_web::test]
async fn test_settings_require_token() {
    let store = Arc::new(MemoryStore::new());

    let app = test::init_service(
        App::new()
            .app_data(test_app_state(store.clone()))
            .configure(routes::configure),
    )
    .await;

    let get = test::TestRequest::get().uri("/api/settings").to_request();
    assert_eq!(
        test::call_service(&app, get).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let put = test::TestRequest::put()
        .uri("/api/settings")
        .set_json(json!({
            "paymentGracePeriod": 1,
            "autoRevokeUnpaidAllocations": false,
            "maxRoomCapacity": 1,
            "allowMixedGender": false
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, put).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert!(store.get_settings().await.unwrap().is_none());
}
