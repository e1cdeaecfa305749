//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the identity router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Membership store connection settings.
    pub database: DatabaseConfig,

    /// Location prefix, default destination and table rules.
    pub rewrite: RewriteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Membership store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Data source URL, e.g. `postgres://db.internal/users` or
    /// `sqlite:///var/lib/router/users.db`.
    pub url: String,

    /// Optional user name, merged into the URL at connect time.
    pub username: Option<String>,

    /// Optional password, merged into the URL at connect time.
    pub password: Option<String>,

    /// Column holding user identities in every referenced table.
    pub identity_column: String,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// How long a request waits for a pooled connection, in seconds.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            identity_column: "name".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Rewrite rules for the virtual location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Virtual path prefix seen by clients (e.g. "/dir").
    pub location: String,

    /// Destination prefix used when the identity is in no table.
    pub default_destination: String,

    /// Whitespace-delimited `table destination` pairs, in priority order.
    pub tables: String,

    /// Filesystem root that rewritten paths are served from.
    pub document_root: PathBuf,

    /// Request header carrying the identity set by the upstream auth layer.
    pub identity_header: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            location: String::new(),
            default_destination: String::new(),
            tables: String::new(),
            document_root: PathBuf::from("public"),
            identity_header: "x-remote-user".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Deadline for resolving one identity across all tables, in milliseconds.
    pub resolve_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            resolve_ms: 2_000,
        }
    }
}

/// Log output flavour.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Log formatter to install.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            log_format: LogFormat::Full,
        }
    }
}
