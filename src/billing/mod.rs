//! Subscription billing: plans, user subscriptions, and payment
//! transactions.

pub mod error;
pub mod models;
pub mod routes;
pub mod storage;
pub mod subscription;
pub mod transaction;

pub use error::BillingError;
pub use models::{
    BillingPeriod, Plan, StoredSubscription, SubscriptionStatus, Transaction, TransactionStatus,
};
pub use routes::BillingModule;
pub use storage::{BillingStore, InMemoryBillingStore};
pub use subscription::{SubscriptionManager, SubscriptionStatusView};
pub use transaction::TransactionRecorder;
