//! Subscription lifecycle management.

use super::error::BillingError;
use super::models::{BillingPeriod, Plan, StoredSubscription, SubscriptionStatus};
use super::storage::BillingStore;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price_cents: i64,
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
    pub billing_period: BillingPeriod,
}

/// A user's subscription joined with its plan, as returned by the status
/// endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatusView {
    pub status: SubscriptionStatus,
    pub plan_id: Uuid,
    pub plan_name: String,
    pub started_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Manages plans and subscription state transitions.
///
/// The `*_if_*` helpers exist for webhook processing: they report whether
/// the transition applied instead of failing, so an out-of-order or stale
/// payment event degrades to a no-op.
pub struct SubscriptionManager {
    store: Arc<dyn BillingStore>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self { store }
    }

    pub async fn create_plan(&self, input: CreatePlanInput) -> Result<Plan> {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: input.name,
            price_cents: input.price_cents,
            currency: input.currency.to_ascii_uppercase(),
            billing_period: input.billing_period,
        };
        self.store.create_plan(&plan).await?;
        tracing::info!(plan_id = %plan.id, name = %plan.name, "plan created");
        Ok(plan)
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>> {
        self.store.list_plans().await
    }

    /// Subscribe the user to a plan. A live subscription already on record
    /// is a conflict; the store enforces this atomically.
    pub async fn subscribe(&self, user_id: Uuid, plan_id: Uuid) -> Result<StoredSubscription> {
        if self.store.get_plan(plan_id).await?.is_none() {
            return Err(BillingError::PlanNotFound {
                plan_id: plan_id.to_string(),
            }
            .into());
        }
        let subscription = self.store.create_active_subscription(user_id, plan_id).await?;
        tracing::info!(user_id = %user_id, plan_id = %plan_id, "subscription created");
        Ok(subscription)
    }

    /// Cancel the user's subscription. Only a live subscription can be
    /// canceled; canceling twice is a conflict.
    pub async fn cancel(&self, user_id: Uuid) -> Result<StoredSubscription> {
        let current = self
            .store
            .get_subscription(user_id)
            .await?
            .ok_or_else(|| BillingError::NoSubscription {
                user_id: user_id.to_string(),
            })?;

        let canceled = self
            .store
            .transition_subscription(
                user_id,
                &[SubscriptionStatus::Active, SubscriptionStatus::PastDue],
                SubscriptionStatus::Canceled,
                Some(Utc::now()),
            )
            .await?
            .ok_or_else(|| BillingError::InvalidTransition {
                user_id: user_id.to_string(),
                from: current.status.to_string(),
                to: SubscriptionStatus::Canceled.to_string(),
            })?;
        tracing::info!(user_id = %user_id, "subscription canceled");
        Ok(canceled)
    }

    /// Current subscription joined with its plan.
    pub async fn status(&self, user_id: Uuid) -> Result<SubscriptionStatusView> {
        let subscription = self
            .store
            .get_subscription(user_id)
            .await?
            .ok_or_else(|| BillingError::NoSubscription {
                user_id: user_id.to_string(),
            })?;
        let plan = self
            .store
            .get_plan(subscription.plan_id)
            .await?
            .ok_or_else(|| BillingError::PlanNotFound {
                plan_id: subscription.plan_id.to_string(),
            })?;
        Ok(SubscriptionStatusView {
            status: subscription.status,
            plan_id: plan.id,
            plan_name: plan.name,
            started_at: subscription.started_at,
            ends_at: subscription.ends_at,
        })
    }

    /// Active -> past-due, applied when a payment fails. Returns whether
    /// anything changed.
    pub async fn mark_past_due_if_active(&self, user_id: Uuid) -> Result<bool> {
        let moved = self
            .store
            .transition_subscription(
                user_id,
                &[SubscriptionStatus::Active],
                SubscriptionStatus::PastDue,
                None,
            )
            .await?;
        Ok(moved.is_some())
    }

    /// Past-due -> active, applied when a payment completes.
    pub async fn restore_if_past_due(&self, user_id: Uuid) -> Result<bool> {
        let moved = self
            .store
            .transition_subscription(
                user_id,
                &[SubscriptionStatus::PastDue],
                SubscriptionStatus::Active,
                None,
            )
            .await?;
        Ok(moved.is_some())
    }

    /// Live -> canceled, applied when the processor reports cancellation.
    pub async fn cancel_if_live(&self, user_id: Uuid) -> Result<bool> {
        let moved = self
            .store
            .transition_subscription(
                user_id,
                &[SubscriptionStatus::Active, SubscriptionStatus::PastDue],
                SubscriptionStatus::Canceled,
                Some(Utc::now()),
            )
            .await?;
        Ok(moved.is_some())
    }
}
