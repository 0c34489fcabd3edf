use driftpress::webhooks::HmacSha256Verifier;
use driftpress::{app, ConfigBuilder, ConnectionRegistry, Domain};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().from_env().build();
    driftpress::init_tracing_with_config(&config.logging);

    let registry = ConnectionRegistry::from_config(&config.database)?;
    for domain in [Domain::Content, Domain::Billing] {
        let conn = registry.resolve(domain)?;
        if !conn.is_memory() {
            anyhow::bail!(
                "connection '{}' for the {} domain uses unsupported scheme '{}'; \
                 only memory:// backends are wired in",
                registry.connection_name(domain).unwrap_or("?"),
                domain,
                conn.scheme()
            );
        }
        tracing::info!(%domain, url = %conn.url, "database connection resolved");
    }

    let mut builder = app::AppContext::builder();
    if let Some(secret) = &config.webhook.secret {
        builder = builder.with_webhook_verifier(Arc::new(HmacSha256Verifier::new(secret.clone())));
    } else {
        tracing::warn!("no webhook secret configured; signatures will not be verified");
    }
    let ctx = builder.build();

    let addr = config.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "driftpress listening");
    axum::serve(listener, app::router(ctx)).await?;
    Ok(())
}
