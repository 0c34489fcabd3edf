//! Request identity.
//!
//! The service sits behind an authenticating proxy that forwards the
//! caller's user id in the `x-user-id` header. The extractor checks the id
//! against the user store; endpoints that need staff rights call
//! [`CurrentUser::require_staff`].

use crate::app::AppContext;
use crate::error::AppError;
use crate::users::User;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Rejects non-staff callers with 403.
    pub fn require_staff(&self) -> Result<&User, AppError> {
        if self.0.is_staff {
            Ok(&self.0)
        } else {
            Err(AppError::forbidden("Staff access required"))
        }
    }
}

impl FromRequestParts<AppContext> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        let id = Uuid::parse_str(raw)
            .map_err(|_| AppError::unauthorized("Invalid user credential"))?;

        let user = ctx
            .users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown user"))?;

        Ok(Self(user))
    }
}

/// Optional identity: a missing header is anonymous, a bad one still fails.
impl OptionalFromRequestParts<AppContext> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &AppContext,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(USER_ID_HEADER) {
            return Ok(None);
        }
        <Self as FromRequestParts<AppContext>>::from_request_parts(parts, ctx)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::User;

    #[test]
    fn test_require_staff_rejects_regular_user() {
        let current = CurrentUser(User::new("bob", "bob@example.com"));
        let err = current.require_staff().unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_require_staff_allows_staff() {
        let current = CurrentUser(User::staff("admin", "admin@example.com"));
        assert!(current.require_staff().is_ok());
    }
}
