//! Storage trait for billing state, with an in-memory implementation.
//!
//! Subscription state changes go through two atomic operations:
//! [`BillingStore::create_active_subscription`], which refuses to create a
//! second live subscription, and [`BillingStore::transition_subscription`],
//! which applies a status change only from an allowed set of prior states.
//! Check-then-act sequences built from separate reads would race; callers
//! must use these instead.

use super::error::BillingError;
use super::models::{
    Plan, StoredSubscription, SubscriptionStatus, Transaction, TransactionStatus,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Trait for storing plans, subscriptions, and transactions.
#[async_trait]
pub trait BillingStore: Send + Sync {
    // Plans

    async fn create_plan(&self, plan: &Plan) -> Result<()>;

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>>;

    /// All plans, sorted by price ascending.
    async fn list_plans(&self) -> Result<Vec<Plan>>;

    // Subscriptions

    async fn get_subscription(&self, user_id: Uuid) -> Result<Option<StoredSubscription>>;

    /// Atomically create an active subscription for the user.
    ///
    /// Fails with a conflict when a live (active or past-due) subscription
    /// already exists; a canceled one is replaced. Under concurrent calls
    /// for the same user exactly one wins.
    async fn create_active_subscription(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<StoredSubscription>;

    /// Atomically move the user's subscription to `to`, but only when its
    /// current status is in `allowed_from`. Returns `None` when the user
    /// has no subscription or its status is outside the allowed set.
    async fn transition_subscription(
        &self,
        user_id: Uuid,
        allowed_from: &[SubscriptionStatus],
        to: SubscriptionStatus,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<Option<StoredSubscription>>;

    // Transactions

    /// Record a transaction; a duplicate processor reference is a conflict.
    async fn record_transaction(&self, txn: &Transaction) -> Result<()>;

    async fn get_transaction_by_reference(&self, reference: &str) -> Result<Option<Transaction>>;

    /// Transactions for a user, newest first.
    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>>;

    async fn update_transaction_status(
        &self,
        reference: &str,
        status: TransactionStatus,
    ) -> Result<Transaction>;
}

/// In-memory billing store. One lock over the whole state keeps the
/// subscription operations atomic.
#[derive(Default, Clone)]
pub struct InMemoryBillingStore {
    state: Arc<RwLock<BillingState>>,
}

#[derive(Default)]
struct BillingState {
    plans: HashMap<Uuid, Plan>,
    subscriptions: HashMap<Uuid, StoredSubscription>,
    transactions: HashMap<String, Transaction>,
}

impl InMemoryBillingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn create_plan(&self, plan: &Plan) -> Result<()> {
        self.state.write().await.plans.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>> {
        Ok(self.state.read().await.plans.get(&id).cloned())
    }

    async fn list_plans(&self) -> Result<Vec<Plan>> {
        let state = self.state.read().await;
        let mut plans: Vec<Plan> = state.plans.values().cloned().collect();
        plans.sort_by_key(|p| p.price_cents);
        Ok(plans)
    }

    async fn get_subscription(&self, user_id: Uuid) -> Result<Option<StoredSubscription>> {
        Ok(self.state.read().await.subscriptions.get(&user_id).cloned())
    }

    async fn create_active_subscription(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<StoredSubscription> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.subscriptions.get(&user_id) {
            if existing.status != SubscriptionStatus::Canceled {
                return Err(BillingError::AlreadySubscribed {
                    user_id: user_id.to_string(),
                }
                .into());
            }
        }
        let subscription = StoredSubscription {
            user_id,
            plan_id,
            status: SubscriptionStatus::Active,
            started_at: Utc::now(),
            ends_at: None,
        };
        state.subscriptions.insert(user_id, subscription.clone());
        Ok(subscription)
    }

    async fn transition_subscription(
        &self,
        user_id: Uuid,
        allowed_from: &[SubscriptionStatus],
        to: SubscriptionStatus,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<Option<StoredSubscription>> {
        let mut state = self.state.write().await;
        let Some(subscription) = state.subscriptions.get_mut(&user_id) else {
            return Ok(None);
        };
        if !allowed_from.contains(&subscription.status) {
            return Ok(None);
        }
        subscription.status = to;
        subscription.ends_at = ends_at;
        Ok(Some(subscription.clone()))
    }

    async fn record_transaction(&self, txn: &Transaction) -> Result<()> {
        let mut state = self.state.write().await;
        if state.transactions.contains_key(&txn.reference) {
            return Err(BillingError::DuplicateReference {
                reference: txn.reference.clone(),
            }
            .into());
        }
        state.transactions.insert(txn.reference.clone(), txn.clone());
        Ok(())
    }

    async fn get_transaction_by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        Ok(self.state.read().await.transactions.get(reference).cloned())
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut txns: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        txns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(txns)
    }

    async fn update_transaction_status(
        &self,
        reference: &str,
        status: TransactionStatus,
    ) -> Result<Transaction> {
        let mut state = self.state.write().await;
        let txn = state.transactions.get_mut(reference).ok_or_else(|| {
            crate::error::AppError::from(BillingError::TransactionNotFound {
                reference: reference.to_string(),
            })
        })?;
        txn.status = status;
        txn.updated_at = Utc::now();
        Ok(txn.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_second_live_subscription_conflicts() {
        let store = InMemoryBillingStore::new();
        let (user, plan) = (Uuid::new_v4(), Uuid::new_v4());

        store.create_active_subscription(user, plan).await.unwrap();
        let err = store
            .create_active_subscription(user, plan)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_resubscribe_after_cancel() {
        let store = InMemoryBillingStore::new();
        let (user, plan) = (Uuid::new_v4(), Uuid::new_v4());

        store.create_active_subscription(user, plan).await.unwrap();
        store
            .transition_subscription(
                user,
                &[SubscriptionStatus::Active],
                SubscriptionStatus::Canceled,
                Some(Utc::now()),
            )
            .await
            .unwrap()
            .unwrap();

        let sub = store.create_active_subscription(user, plan).await.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.ends_at, None);
    }

    #[tokio::test]
    async fn test_transition_respects_allowed_states() {
        let store = InMemoryBillingStore::new();
        let (user, plan) = (Uuid::new_v4(), Uuid::new_v4());
        store.create_active_subscription(user, plan).await.unwrap();

        // Active is not in the allowed set, so nothing moves.
        let out = store
            .transition_subscription(
                user,
                &[SubscriptionStatus::PastDue],
                SubscriptionStatus::Active,
                None,
            )
            .await
            .unwrap();
        assert!(out.is_none());
        let sub = store.get_subscription(user).await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_duplicate_transaction_reference_conflicts() {
        let store = InMemoryBillingStore::new();
        let txn = Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount_cents: 999,
            currency: "USD".to_string(),
            status: TransactionStatus::Completed,
            reference: "TX-1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.record_transaction(&txn).await.unwrap();
        let err = store.record_transaction(&txn).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
