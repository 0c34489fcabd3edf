use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for storing processed webhook event IDs to prevent duplicate
/// processing.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Check if an event has already been processed.
    async fn is_processed(&self, event_id: &str) -> Result<bool>;

    /// Mark an event as processed.
    async fn mark_processed(&self, event_id: String) -> Result<()>;
}

/// In-memory idempotency store.
///
/// In production, back this with the transactions database so replays are
/// caught across restarts.
#[derive(Default)]
pub struct MemoryIdempotencyStore {
    processed: Arc<RwLock<HashSet<String>>>,
}

impl MemoryIdempotencyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn is_processed(&self, event_id: &str) -> Result<bool> {
        let processed = self.processed.read().await;
        Ok(processed.contains(event_id))
    }

    async fn mark_processed(&self, event_id: String) -> Result<()> {
        let mut processed = self.processed.write().await;
        processed.insert(event_id);
        Ok(())
    }
}
