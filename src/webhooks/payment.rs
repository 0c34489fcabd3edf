//! Payment notification events and their handler.

use crate::billing::error::BillingError;
use crate::billing::models::TransactionStatus;
use crate::billing::subscription::SubscriptionManager;
use crate::billing::transaction::TransactionRecorder;
use crate::error::{AppError, Result};
use crate::webhooks::idempotency::IdempotencyStore;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Trait representing a webhook event.
pub trait WebhookEvent: DeserializeOwned + Send + Sync {
    /// Unique event ID for idempotency checking.
    fn event_id(&self) -> &str;

    /// Event type/name, for logging.
    fn event_type(&self) -> &str;
}

/// Trait for handling webhook events.
#[async_trait]
pub trait WebhookHandler<E: WebhookEvent>: Send + Sync {
    async fn handle(&self, event: &E) -> Result<()>;

    /// Validate the event before handling.
    async fn validate(&self, _event: &E) -> Result<()> {
        Ok(())
    }

    /// Called when processing fails, before the error propagates.
    async fn on_error(&self, event: &E, error: &AppError) {
        tracing::error!(
            event_id = event.event_id(),
            event_type = event.event_type(),
            error = %error,
            "webhook processing failed"
        );
    }
}

/// Process one event: skip if already seen, validate, handle, then record
/// the event id. The id is recorded only after the handler succeeds, so a
/// failed delivery can be retried.
pub async fn dispatch<E, H>(
    event: &E,
    handler: &H,
    idempotency_store: &dyn IdempotencyStore,
) -> Result<()>
where
    E: WebhookEvent,
    H: WebhookHandler<E>,
{
    if idempotency_store.is_processed(event.event_id()).await? {
        tracing::debug!(
            event_id = event.event_id(),
            "skipping already processed event"
        );
        return Ok(());
    }

    handler.validate(event).await?;

    match handler.handle(event).await {
        Ok(()) => {
            idempotency_store
                .mark_processed(event.event_id().to_string())
                .await?;
            tracing::info!(
                event_id = event.event_id(),
                event_type = event.event_type(),
                "webhook processed"
            );
            Ok(())
        }
        Err(e) => {
            handler.on_error(event, &e).await;
            Err(e)
        }
    }
}

/// Kinds of payment notification the processor sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    PaymentCompleted,
    PaymentFailed,
    SubscriptionCanceled,
}

impl PaymentEventKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentCompleted => "payment_completed",
            Self::PaymentFailed => "payment_failed",
            Self::SubscriptionCanceled => "subscription_canceled",
        }
    }
}

/// A payment notification as posted by the processor.
///
/// `txn_id` is the processor's transaction reference and doubles as the
/// idempotency key; `custom` carries the user id the checkout was started
/// for.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub txn_id: String,
    pub event: PaymentEventKind,
    pub custom: String,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl WebhookEvent for PaymentNotification {
    fn event_id(&self) -> &str {
        &self.txn_id
    }

    fn event_type(&self) -> &str {
        self.event.as_str()
    }
}

/// Applies payment notifications to billing state.
///
/// A completed payment records a completed transaction and restores a
/// past-due subscription; a failed payment records a failed transaction and
/// moves an active subscription to past-due; a cancellation cancels any
/// live subscription.
pub struct PaymentNotificationHandler {
    transactions: Arc<TransactionRecorder>,
    subscriptions: Arc<SubscriptionManager>,
}

impl PaymentNotificationHandler {
    pub fn new(
        transactions: Arc<TransactionRecorder>,
        subscriptions: Arc<SubscriptionManager>,
    ) -> Self {
        Self {
            transactions,
            subscriptions,
        }
    }

    fn user_id(&self, event: &PaymentNotification) -> Result<Uuid> {
        Uuid::parse_str(&event.custom).map_err(|_| {
            BillingError::InvalidWebhookPayload {
                message: format!("'{}' is not a user id", event.custom),
            }
            .into()
        })
    }
}

#[async_trait]
impl WebhookHandler<PaymentNotification> for PaymentNotificationHandler {
    async fn validate(&self, event: &PaymentNotification) -> Result<()> {
        self.user_id(event)?;
        let is_payment = matches!(
            event.event,
            PaymentEventKind::PaymentCompleted | PaymentEventKind::PaymentFailed
        );
        if is_payment && event.amount_cents <= 0 {
            return Err(BillingError::InvalidWebhookPayload {
                message: "amount must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn handle(&self, event: &PaymentNotification) -> Result<()> {
        let user_id = self.user_id(event)?;

        match event.event {
            PaymentEventKind::PaymentCompleted => {
                self.transactions
                    .record(
                        user_id,
                        event.amount_cents,
                        &event.currency,
                        TransactionStatus::Completed,
                        &event.txn_id,
                    )
                    .await?;
                let restored = self.subscriptions.restore_if_past_due(user_id).await?;
                if restored {
                    tracing::info!(user_id = %user_id, "subscription restored to active");
                }
            }
            PaymentEventKind::PaymentFailed => {
                self.transactions
                    .record(
                        user_id,
                        event.amount_cents,
                        &event.currency,
                        TransactionStatus::Failed,
                        &event.txn_id,
                    )
                    .await?;
                let demoted = self.subscriptions.mark_past_due_if_active(user_id).await?;
                if demoted {
                    tracing::warn!(user_id = %user_id, "subscription marked past due");
                }
            }
            PaymentEventKind::SubscriptionCanceled => {
                // No transaction to record; a stale event is a no-op.
                let canceled = self.subscriptions.cancel_if_live(user_id).await?;
                if canceled {
                    tracing::info!(user_id = %user_id, "subscription canceled by processor");
                }
            }
        }
        Ok(())
    }
}
