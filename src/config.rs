use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Main configuration for a Driftpress application.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Named database connections plus an explicit domain-to-connection map.
///
/// Content entities and billing entities live on separately named
/// connections; handlers never pick a connection implicitly. The routing
/// is plain configuration resolved through
/// [`ConnectionRegistry`](crate::database::ConnectionRegistry).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection name -> connection settings.
    pub connections: HashMap<String, ConnectionConfig>,
    /// Which named connection each domain uses.
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    pub url: String,
}

impl ConnectionConfig {
    /// The URL scheme ("memory", "postgres", ...).
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.split(':').next().unwrap_or("")
    }

    /// Whether this connection is the built-in in-memory backend.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.scheme() == "memory"
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default = "default_content_connection")]
    pub content: String,
    #[serde(default = "default_billing_connection")]
    pub billing: String,
}

/// Webhook ingestion settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookConfig {
    /// Shared secret for HMAC signature verification. When unset the
    /// webhook endpoint accepts unsigned notifications (dev only).
    pub secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let mut connections = HashMap::new();
        connections.insert(
            default_content_connection(),
            ConnectionConfig {
                url: "memory://content".to_string(),
            },
        );
        connections.insert(
            default_billing_connection(),
            ConnectionConfig {
                url: "memory://transactions".to_string(),
            },
        );
        Self {
            connections,
            routing: RoutingConfig {
                content: default_content_connection(),
                billing: default_billing_connection(),
            },
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_content_connection() -> String {
    "primary".to_string()
}

fn default_billing_connection() -> String {
    "transactions".to_string()
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for [`Config`] with environment variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_connection(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.config
            .database
            .connections
            .insert(name.into(), ConnectionConfig { url: url.into() });
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.webhook.secret = Some(secret.into());
        self
    }

    /// Overlay `DRIFTPRESS_*` environment variables onto the current config.
    pub fn from_env(mut self) -> Self {
        if let Ok(host) = std::env::var("DRIFTPRESS_HOST") {
            self.config.server.host = host;
        }
        if let Ok(port) = std::env::var("DRIFTPRESS_PORT") {
            if let Ok(port) = port.parse() {
                self.config.server.port = port;
            }
        }
        if let Ok(level) = std::env::var("DRIFTPRESS_LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Ok(json) = std::env::var("DRIFTPRESS_LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Ok(url) = std::env::var("DRIFTPRESS_DATABASE_URL") {
            let name = self.config.database.routing.content.clone();
            self.config
                .database
                .connections
                .insert(name, ConnectionConfig { url });
        }
        if let Ok(url) = std::env::var("DRIFTPRESS_TRANSACTIONS_DATABASE_URL") {
            let name = self.config.database.routing.billing.clone();
            self.config
                .database
                .connections
                .insert(name, ConnectionConfig { url });
        }
        if let Ok(secret) = std::env::var("DRIFTPRESS_WEBHOOK_SECRET") {
            self.config.webhook.secret = Some(secret);
        }
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
