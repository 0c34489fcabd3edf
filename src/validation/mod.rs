//! Request validation support.
//!
//! Typed input structs derive `validator::Validate`; the [`ValidatedJson`]
//! extractor deserializes and validates in one step, rejecting bad input
//! with a 400 before the handler runs.

use crate::error::AppError;
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor that runs `validate()` on the deserialized value.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(format!("Invalid JSON body: {}", e.body_text())))?;
        value.validate()?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::post};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct SignupInput {
        #[validate(email)]
        email: String,
    }

    async fn signup(ValidatedJson(input): ValidatedJson<SignupInput>) -> String {
        input.email
    }

    fn app() -> Router {
        Router::new().route("/signup", post(signup))
    }

    fn request(body: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/signup")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let response = app()
            .oneshot(request(r#"{"email": "a@example.com"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_field_rejected() {
        let response = app()
            .oneshot(request(r#"{"email": "not-an-email"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let response = app().oneshot(request("{ nope")).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
