//! Payment transaction recording.

use super::error::BillingError;
use super::models::{Transaction, TransactionStatus};
use super::storage::BillingStore;
use crate::error::Result;
use crate::users::UserStore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Records payment transactions against known users.
///
/// Every record is checked against the user store first; a payment event
/// naming a user this system has never seen is rejected rather than
/// silently stored.
pub struct TransactionRecorder {
    store: Arc<dyn BillingStore>,
    users: Arc<dyn UserStore>,
}

impl TransactionRecorder {
    pub fn new(store: Arc<dyn BillingStore>, users: Arc<dyn UserStore>) -> Self {
        Self { store, users }
    }

    /// Record a transaction keyed by the processor's reference. A duplicate
    /// reference is a conflict.
    pub async fn record(
        &self,
        user_id: Uuid,
        amount_cents: i64,
        currency: &str,
        status: TransactionStatus,
        reference: &str,
    ) -> Result<Transaction> {
        if self.users.get_user(user_id).await?.is_none() {
            return Err(BillingError::UserNotFound {
                user_id: user_id.to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let txn = Transaction {
            id: Uuid::new_v4(),
            user_id,
            amount_cents,
            currency: currency.to_ascii_uppercase(),
            status,
            reference: reference.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.record_transaction(&txn).await?;
        tracing::info!(
            user_id = %user_id,
            reference = %reference,
            amount_cents,
            ?status,
            "transaction recorded"
        );
        Ok(txn)
    }

    pub async fn update_status(
        &self,
        reference: &str,
        status: TransactionStatus,
    ) -> Result<Transaction> {
        self.store.update_transaction_status(reference, status).await
    }

    pub async fn get_by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        self.store.get_transaction_by_reference(reference).await
    }

    /// Transactions for a user, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        self.store.list_transactions(user_id).await
    }
}
