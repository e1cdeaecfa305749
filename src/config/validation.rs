//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the rewrite section compiles into a routing table
//! - Check the data source URL and identifiers are usable
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::rules::RuleParseError;
use crate::routing::table::RoutingTable;
use crate::store::is_valid_identifier;
use crate::store::sql::{DataSource, DataSourceError};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("rewrite.location is required")]
    MissingLocation,

    #[error("rewrite.location `{0}` must start with '/'")]
    InvalidLocation(String),

    #[error("rewrite.default_destination is required")]
    MissingDefaultDestination,

    #[error("rewrite.default_destination `{0}` must start with '/'")]
    InvalidDefaultDestination(String),

    #[error("rewrite.tables: {0}")]
    Tables(RuleParseError),

    #[error("rewrite.identity_header `{0}` is not a valid header name")]
    InvalidIdentityHeader(String),

    #[error("database.url: {0}")]
    DataSource(DataSourceError),

    #[error("database.identity_column `{0}` is not a valid identifier")]
    InvalidIdentityColumn(String),

    #[error("database.max_connections must be greater than zero")]
    ZeroPoolSize,

    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = DataSource::from_config(&config.database) {
        errors.push(ValidationError::DataSource(e));
    }
    if !is_valid_identifier(&config.database.identity_column) {
        errors.push(ValidationError::InvalidIdentityColumn(
            config.database.identity_column.clone(),
        ));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::ZeroPoolSize);
    }

    if let Err(rewrite_errors) = RoutingTable::from_config(&config.rewrite) {
        errors.extend(rewrite_errors);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.resolve_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("resolve_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.database.url = "sqlite::memory:".into();
        config.rewrite.location = "/dir".into();
        config.rewrite.default_destination = "/dir.1".into();
        config.rewrite.tables = "t1 /dir.2 t2 /dir.3".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn test_odd_table_list_rejected() {
        let mut config = valid_config();
        config.rewrite.tables = "t1 /dir.2 t2".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::Tables(RuleParseError::OddTokenCount(3))])
        );
    }

    #[test]
    fn test_empty_data_source_rejected() {
        let mut config = valid_config();
        config.database.url = String::new();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::DataSource(DataSourceError::Empty)])
        );
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid_config();
        config.rewrite.location = String::new();
        config.database.identity_column = "name; --".into();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.resolve_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::MissingLocation));
        assert!(errors.contains(&ValidationError::ZeroTimeout("resolve_ms")));
    }
}
