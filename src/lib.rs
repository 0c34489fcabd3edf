//! Driftpress - a blog/CMS service with subscription billing.
//!
//! Built on Axum and Tokio. The content side covers posts, comments, tags,
//! reactions, newsletter subscribers, advertisements, and a staff
//! dashboard; the billing side covers plans, user subscriptions, and
//! payment transactions fed by verified processor webhooks.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use driftpress::{app, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     driftpress::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build();
//!     let ctx = app::AppContext::builder().build();
//!     let router = app::router(ctx);
//!
//!     let addr = config.server.addr().unwrap();
//!     let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod app;
pub mod auth;
pub mod billing;
pub mod blog;
mod config;
pub mod database;
mod error;
pub mod http;
pub mod users;
pub mod validation;
pub mod webhooks;

// Re-exports for public API
pub use app::{router, AppContext, AppContextBuilder};
pub use config::{
    Config, ConfigBuilder, ConnectionConfig, DatabaseConfig, LoggingConfig, ServerConfig,
    WebhookConfig,
};
pub use database::{ConnectionRegistry, Domain};
pub use error::{AppError, Result};
pub use http::{
    query::PaginationQuery,
    response::{JsonResponse, PaginatedData, PaginationMeta, StatusResponse},
    routes::RouteModule,
};
pub use users::{InMemoryUserStore, User, UserStore};
pub use validation::ValidatedJson;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults.
///
/// Call early in `main()`, before building the app.
///
/// # Environment Variables
///
/// - `RUST_LOG`: log filter (e.g. "info", "debug", "driftpress=debug")
/// - `DRIFTPRESS_LOG_JSON`: set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("DRIFTPRESS_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing from a [`LoggingConfig`], falling back to `RUST_LOG`
/// when set.
pub fn init_tracing_with_config(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

    if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
