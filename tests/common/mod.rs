#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use driftpress::auth::USER_ID_HEADER;
use driftpress::users::{InMemoryUserStore, User, UserStore};
use driftpress::webhooks::WebhookVerifier;
use driftpress::{app, AppContext};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// A routed application with a few seeded users.
pub struct TestApp {
    pub router: Router,
    pub alice: User,
    pub bob: User,
    pub staff: User,
}

pub async fn test_app() -> TestApp {
    build(None).await
}

pub async fn test_app_with_verifier(verifier: Arc<dyn WebhookVerifier>) -> TestApp {
    build(Some(verifier)).await
}

async fn build(verifier: Option<Arc<dyn WebhookVerifier>>) -> TestApp {
    let users = InMemoryUserStore::new();
    let alice = User::new("alice", "alice@example.com");
    let bob = User::new("bob", "bob@example.com");
    let staff = User::staff("admin", "admin@example.com");
    for user in [&alice, &bob, &staff] {
        users.create_user(user).await.unwrap();
    }

    let mut builder = AppContext::builder().with_users(Arc::new(users));
    if let Some(verifier) = verifier {
        builder = builder.with_webhook_verifier(verifier);
    }

    TestApp {
        router: app::router(builder.build()),
        alice,
        bob,
        staff,
    }
}

/// Build a JSON request, optionally authenticated as `user`.
pub fn json_request(
    method: &str,
    uri: &str,
    user: Option<&User>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.id.to_string());
    }
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Dispatch a request and decode the JSON response body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
