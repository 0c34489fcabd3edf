//! Application context and router assembly.
//!
//! [`AppContext`] carries every shared dependency as an `Arc` handle, so
//! handlers and services receive their collaborators instead of reaching
//! for globals. The builder fills in in-memory defaults, which is what the
//! tests run against.

use crate::billing::storage::{BillingStore, InMemoryBillingStore};
use crate::billing::subscription::SubscriptionManager;
use crate::billing::transaction::TransactionRecorder;
use crate::blog::routes::BlogModule;
use crate::blog::service::BlogService;
use crate::blog::storage::{BlogStore, InMemoryBlogStore};
use crate::http::routes::RouteModule;
use crate::users::{InMemoryUserStore, UserStore};
use crate::webhooks::idempotency::{IdempotencyStore, MemoryIdempotencyStore};
use crate::webhooks::routes::WebhookModule;
use crate::webhooks::verification::{NoVerification, WebhookVerifier};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state for dependency injection.
#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UserStore>,
    pub blog: Arc<BlogService>,
    pub subscriptions: Arc<SubscriptionManager>,
    pub transactions: Arc<TransactionRecorder>,
    pub webhook_verifier: Arc<dyn WebhookVerifier>,
    pub webhook_events: Arc<dyn IdempotencyStore>,
}

impl AppContext {
    /// Builder pattern for constructing AppContext.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`AppContext`] with in-memory defaults.
#[must_use = "builder does nothing until you call build()"]
#[derive(Default)]
pub struct AppContextBuilder {
    users: Option<Arc<dyn UserStore>>,
    blog_store: Option<Arc<dyn BlogStore>>,
    billing_store: Option<Arc<dyn BillingStore>>,
    webhook_verifier: Option<Arc<dyn WebhookVerifier>>,
    webhook_events: Option<Arc<dyn IdempotencyStore>>,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn with_blog_store(mut self, store: Arc<dyn BlogStore>) -> Self {
        self.blog_store = Some(store);
        self
    }

    pub fn with_billing_store(mut self, store: Arc<dyn BillingStore>) -> Self {
        self.billing_store = Some(store);
        self
    }

    pub fn with_webhook_verifier(mut self, verifier: Arc<dyn WebhookVerifier>) -> Self {
        self.webhook_verifier = Some(verifier);
        self
    }

    pub fn with_webhook_events(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.webhook_events = Some(store);
        self
    }

    pub fn build(self) -> AppContext {
        let users = self
            .users
            .unwrap_or_else(|| Arc::new(InMemoryUserStore::new()));
        let blog_store = self
            .blog_store
            .unwrap_or_else(|| Arc::new(InMemoryBlogStore::new()));
        let billing_store = self
            .billing_store
            .unwrap_or_else(|| Arc::new(InMemoryBillingStore::new()));

        let blog = Arc::new(BlogService::new(blog_store));
        let subscriptions = Arc::new(SubscriptionManager::new(billing_store.clone()));
        let transactions = Arc::new(TransactionRecorder::new(billing_store, users.clone()));

        AppContext {
            users,
            blog,
            subscriptions,
            transactions,
            webhook_verifier: self
                .webhook_verifier
                .unwrap_or_else(|| Arc::new(NoVerification)),
            webhook_events: self
                .webhook_events
                .unwrap_or_else(|| Arc::new(MemoryIdempotencyStore::new())),
        }
    }
}

/// Assemble the full application router over the given context.
pub fn router(ctx: AppContext) -> Router {
    let router = Router::new();
    let router = BlogModule.register(router);
    let router = crate::billing::routes::BillingModule.register(router);
    let router = WebhookModule.register(router);
    router
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
