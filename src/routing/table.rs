//! Compiled routing table.
//!
//! # Responsibilities
//! - Turn the `[rewrite]` config section into an immutable lookup value
//! - Report every problem with the section, not just the first
//!
//! # Design Decisions
//! - Built once per activation (and per reload), shared via `Arc`
//! - Location matching is a literal prefix test

use std::path::PathBuf;

use axum::http::HeaderName;

use crate::config::schema::RewriteConfig;
use crate::config::validation::ValidationError;
use crate::routing::rules::RuleSet;

#[derive(Debug, Clone)]
pub struct RoutingTable {
    /// Virtual location prefix.
    pub location: String,
    /// Destination used when no table matches.
    pub default_destination: String,
    /// Ordered table rules.
    pub rules: RuleSet,
    /// Root that rewritten paths are served from.
    pub document_root: PathBuf,
    /// Header carrying the authenticated identity.
    pub identity_header: HeaderName,
}

impl RoutingTable {
    pub fn from_config(config: &RewriteConfig) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        if config.location.is_empty() {
            errors.push(ValidationError::MissingLocation);
        } else if !config.location.starts_with('/') {
            errors.push(ValidationError::InvalidLocation(config.location.clone()));
        }

        if config.default_destination.is_empty() {
            errors.push(ValidationError::MissingDefaultDestination);
        } else if !config.default_destination.starts_with('/') {
            errors.push(ValidationError::InvalidDefaultDestination(
                config.default_destination.clone(),
            ));
        }

        let rules = match RuleSet::parse(&config.tables) {
            Ok(rules) => Some(rules),
            Err(e) => {
                errors.push(ValidationError::Tables(e));
                None
            }
        };

        let identity_header = match HeaderName::try_from(config.identity_header.as_str()) {
            Ok(name) => Some(name),
            Err(_) => {
                errors.push(ValidationError::InvalidIdentityHeader(
                    config.identity_header.clone(),
                ));
                None
            }
        };

        match (rules, identity_header) {
            (Some(rules), Some(identity_header)) if errors.is_empty() => Ok(Self {
                location: config.location.clone(),
                default_destination: config.default_destination.clone(),
                rules,
                document_root: config.document_root.clone(),
                identity_header,
            }),
            _ => Err(errors),
        }
    }

    /// True if `path` lies under the virtual location.
    pub fn covers(&self, path: &str) -> bool {
        path.starts_with(&self.location)
    }
}
