//! Billing-specific error types.

use std::fmt;

/// Errors raised by billing operations.
///
/// These carry more context than the generic error and convert to
/// `AppError` for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// The specified plan was not found.
    PlanNotFound { plan_id: String },
    /// The user has no subscription on record.
    NoSubscription { user_id: String },
    /// The user already holds a live subscription.
    AlreadySubscribed { user_id: String },
    /// The subscription is not in a state the operation allows.
    InvalidTransition {
        user_id: String,
        from: String,
        to: String,
    },
    /// The referenced user does not exist.
    UserNotFound { user_id: String },
    /// A transaction with this processor reference already exists.
    DuplicateReference { reference: String },
    /// The referenced transaction was not found.
    TransactionNotFound { reference: String },
    /// Webhook signature is invalid.
    InvalidWebhookSignature,
    /// Webhook payload is malformed.
    InvalidWebhookPayload { message: String },
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlanNotFound { plan_id } => {
                write!(f, "Plan not found: {}", plan_id)
            }
            Self::NoSubscription { user_id } => {
                write!(f, "No subscription found for user '{}'", user_id)
            }
            Self::AlreadySubscribed { user_id } => {
                write!(f, "User '{}' already has an active subscription", user_id)
            }
            Self::InvalidTransition { user_id, from, to } => {
                write!(
                    f,
                    "Cannot move subscription for user '{}' from {} to {}",
                    user_id, from, to
                )
            }
            Self::UserNotFound { user_id } => {
                write!(f, "User not found: {}", user_id)
            }
            Self::DuplicateReference { reference } => {
                write!(f, "Transaction reference already recorded: {}", reference)
            }
            Self::TransactionNotFound { reference } => {
                write!(f, "Transaction not found: {}", reference)
            }
            Self::InvalidWebhookSignature => {
                write!(f, "Invalid webhook signature")
            }
            Self::InvalidWebhookPayload { message } => {
                write!(f, "Invalid webhook payload: {}", message)
            }
        }
    }
}

impl std::error::Error for BillingError {}

impl From<BillingError> for crate::error::AppError {
    fn from(err: BillingError) -> Self {
        match &err {
            BillingError::PlanNotFound { .. }
            | BillingError::NoSubscription { .. }
            | BillingError::UserNotFound { .. }
            | BillingError::TransactionNotFound { .. } => {
                crate::error::AppError::NotFound(err.to_string())
            }

            BillingError::AlreadySubscribed { .. }
            | BillingError::InvalidTransition { .. }
            | BillingError::DuplicateReference { .. } => {
                crate::error::AppError::Conflict(err.to_string())
            }

            BillingError::InvalidWebhookSignature => {
                crate::error::AppError::Unauthorized(err.to_string())
            }

            BillingError::InvalidWebhookPayload { .. } => {
                crate::error::AppError::BadRequest(err.to_string())
            }
        }
    }
}
