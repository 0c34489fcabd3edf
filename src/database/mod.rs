//! Named connection registry.
//!
//! Entities are grouped into domains, and each domain is mapped to a named
//! connection in configuration. Call sites resolve the connection explicitly
//! instead of relying on a process-wide routing hook.

use crate::config::{ConnectionConfig, DatabaseConfig};
use crate::error::{AppError, Result};
use std::collections::HashMap;

/// Entity domains with independently routed storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Blog content: posts, comments, tags, reactions, subscribers, ads.
    Content,
    /// Billing: plans, subscriptions, transactions.
    Billing,
}

impl Domain {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Billing => "billing",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolves a domain to its configured connection.
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    connections: HashMap<String, ConnectionConfig>,
    routing: HashMap<Domain, String>,
}

impl ConnectionRegistry {
    /// Build the registry from configuration, verifying that every routed
    /// connection name actually exists.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let mut routing = HashMap::new();
        routing.insert(Domain::Content, config.routing.content.clone());
        routing.insert(Domain::Billing, config.routing.billing.clone());

        for (domain, name) in &routing {
            if !config.connections.contains_key(name) {
                return Err(AppError::internal(format!(
                    "domain '{}' routed to unknown connection '{}'",
                    domain, name
                )));
            }
        }

        Ok(Self {
            connections: config.connections.clone(),
            routing,
        })
    }

    /// The connection configured for a domain.
    pub fn resolve(&self, domain: Domain) -> Result<&ConnectionConfig> {
        let name = self
            .routing
            .get(&domain)
            .ok_or_else(|| AppError::internal(format!("no connection mapped for domain '{}'", domain)))?;
        self.connections
            .get(name)
            .ok_or_else(|| AppError::internal(format!("connection '{}' not configured", name)))
    }

    /// The connection name a domain is routed to.
    pub fn connection_name(&self, domain: Domain) -> Option<&str> {
        self.routing.get(&domain).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_domains_route_to_separate_connections() {
        let config = ConfigBuilder::new().build();
        let registry = ConnectionRegistry::from_config(&config.database).unwrap();

        assert_eq!(registry.connection_name(Domain::Content), Some("primary"));
        assert_eq!(
            registry.connection_name(Domain::Billing),
            Some("transactions")
        );
        assert_ne!(
            registry.resolve(Domain::Content).unwrap().url,
            registry.resolve(Domain::Billing).unwrap().url
        );
    }

    #[test]
    fn test_missing_connection_rejected_at_build() {
        let mut config = ConfigBuilder::new().build().database;
        config.routing.billing = "does-not-exist".to_string();

        let err = ConnectionRegistry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn test_resolve_returns_configured_url() {
        let config = ConfigBuilder::new()
            .with_connection("primary", "memory://main")
            .build();
        let registry = ConnectionRegistry::from_config(&config.database).unwrap();
        assert_eq!(registry.resolve(Domain::Content).unwrap().url, "memory://main");
    }
}
