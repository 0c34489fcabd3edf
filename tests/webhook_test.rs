mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{json_request, send, test_app_with_verifier, TestApp};
use driftpress::webhooks::HmacSha256Verifier;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;

const SECRET: &str = "whsec_test";

fn sign(payload: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn webhook_request(payload: &serde_json::Value, signature: Option<&str>) -> Request<Body> {
    let body = payload.to_string();
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/payment")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-webhook-signature", signature);
    }
    builder.body(Body::from(body)).unwrap()
}

fn signed_request(payload: &serde_json::Value) -> Request<Body> {
    let signature = sign(payload.to_string().as_bytes());
    webhook_request(payload, Some(&signature))
}

async fn app() -> TestApp {
    test_app_with_verifier(Arc::new(HmacSha256Verifier::new(SECRET))).await
}

async fn subscribe(app: &TestApp) {
    let (status, plan) = send(
        &app.router,
        json_request(
            "POST",
            "/billing/plans",
            Some(&app.staff),
            Some(json!({
                "name": "Pro",
                "price_cents": 999,
                "currency": "USD",
                "billing_period": "monthly",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/billing/subscribe/{}", plan["id"].as_str().unwrap());
    let (status, _) = send(&app.router, json_request("POST", &uri, Some(&app.alice), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_failed_then_completed_payment_cycle() {
    let app = app().await;
    subscribe(&app).await;

    let failed = json!({
        "txn_id": "TX-100",
        "event": "payment_failed",
        "custom": app.alice.id.to_string(),
        "amount_cents": 999,
        "currency": "USD",
    });
    let (status, body) = send(&app.router, signed_request(&failed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));

    let (_, view) = send(
        &app.router,
        json_request("GET", "/billing/status", Some(&app.alice), None),
    )
    .await;
    assert_eq!(view["status"], "past_due");

    let completed = json!({
        "txn_id": "TX-101",
        "event": "payment_completed",
        "custom": app.alice.id.to_string(),
        "amount_cents": 999,
        "currency": "USD",
    });
    let (status, _) = send(&app.router, signed_request(&completed)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, view) = send(
        &app.router,
        json_request("GET", "/billing/status", Some(&app.alice), None),
    )
    .await;
    assert_eq!(view["status"], "active");

    let (_, txns) = send(
        &app.router,
        json_request("GET", "/billing/transactions", Some(&app.alice), None),
    )
    .await;
    assert_eq!(txns.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancellation_event_cancels_subscription() {
    let app = app().await;
    subscribe(&app).await;

    let canceled = json!({
        "txn_id": "TX-200",
        "event": "subscription_canceled",
        "custom": app.alice.id.to_string(),
    });
    let (status, _) = send(&app.router, signed_request(&canceled)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, view) = send(
        &app.router,
        json_request("GET", "/billing/status", Some(&app.alice), None),
    )
    .await;
    assert_eq!(view["status"], "canceled");
}

#[tokio::test]
async fn test_duplicate_delivery_records_one_transaction() {
    let app = app().await;
    subscribe(&app).await;

    let payload = json!({
        "txn_id": "TX-300",
        "event": "payment_completed",
        "custom": app.alice.id.to_string(),
        "amount_cents": 999,
        "currency": "USD",
    });
    let (status, _) = send(&app.router, signed_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app.router, signed_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, txns) = send(
        &app.router,
        json_request("GET", "/billing/transactions", Some(&app.alice), None),
    )
    .await;
    assert_eq!(txns.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let app = app().await;
    let payload = json!({
        "txn_id": "TX-400",
        "event": "payment_completed",
        "custom": app.alice.id.to_string(),
        "amount_cents": 999,
    });

    let (status, body) = send(
        &app.router,
        webhook_request(&payload, Some(&"0".repeat(64))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid webhook signature");
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let app = app().await;
    let payload = json!({
        "txn_id": "TX-401",
        "event": "payment_completed",
        "custom": app.alice.id.to_string(),
        "amount_cents": 999,
    });

    let (status, _) = send(&app.router, webhook_request(&payload, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_user_rejected() {
    let app = app().await;
    let payload = json!({
        "txn_id": "TX-500",
        "event": "payment_completed",
        "custom": uuid::Uuid::new_v4().to_string(),
        "amount_cents": 999,
    });

    let (status, _) = send(&app.router, signed_request(&payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_payload_rejected() {
    let app = app().await;
    let payload = json!({"event": "payment_completed"});

    let (status, _) = send(&app.router, signed_request(&payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_amount_payment_rejected_but_retryable() {
    let app = app().await;
    subscribe(&app).await;

    let payload = json!({
        "txn_id": "TX-600",
        "event": "payment_failed",
        "custom": app.alice.id.to_string(),
        "amount_cents": 0,
    });
    let (status, _) = send(&app.router, signed_request(&payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The event was never marked processed, so a corrected retry succeeds.
    let corrected = json!({
        "txn_id": "TX-600",
        "event": "payment_failed",
        "custom": app.alice.id.to_string(),
        "amount_cents": 999,
    });
    let (status, _) = send(&app.router, signed_request(&corrected)).await;
    assert_eq!(status, StatusCode::OK);
}
