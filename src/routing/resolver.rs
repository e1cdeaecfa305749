//! Identity resolution against the table rules.
//!
//! # Responsibilities
//! - Walk the rules in order, one membership query per rule
//! - Stop at the first table that contains the identity
//! - Surface store failures instead of treating them as "no match"
//!
//! # Design Decisions
//! - All queries of one resolution share one store session
//! - An empty rule set resolves to `Unmatched` without touching the store
//! - A failing table aborts the walk: skipping it could route a user to the
//!   default when a later table would have matched

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;
use crate::resilience::timeouts::{with_deadline, DeadlineExceeded};
use crate::routing::rules::RuleSet;
use crate::store::{MembershipSession, MembershipStore, StoreError};

/// Outcome of a resolution. `Unmatched` is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Resolution {
    Matched { table: String, destination: String },
    Unmatched,
}

impl Resolution {
    /// The matched destination, or `default` when unmatched.
    pub fn destination_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Resolution::Matched { destination, .. } => destination,
            Resolution::Unmatched => default,
        }
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Matched { .. } => "matched",
            Resolution::Unmatched => "unmatched",
        }
    }
}

/// Fatal resolution failure.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot open membership store session: {0}")]
    Connection(#[source] StoreError),

    #[error("membership query against table `{table}` failed: {source}")]
    Query {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("identity resolution timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),
}

/// Resolve `identity` against `rules`, first matching table wins.
pub async fn resolve<S: MembershipStore>(
    store: &S,
    identity: &str,
    rules: &RuleSet,
) -> Result<Resolution, ResolveError> {
    if rules.is_empty() {
        return Ok(Resolution::Unmatched);
    }

    let mut session = store
        .open_session()
        .await
        .map_err(ResolveError::Connection)?;

    for rule in rules {
        let count = session
            .count_members(&rule.table, identity)
            .await
            .map_err(|source| ResolveError::Query {
                table: rule.table.clone(),
                source,
            })?;
        metrics::record_store_query(&rule.table);

        tracing::debug!(
            identity = %identity,
            table = %rule.table,
            count,
            "Membership query"
        );

        if count > 0 {
            return Ok(Resolution::Matched {
                table: rule.table.clone(),
                destination: rule.destination.clone(),
            });
        }
    }

    Ok(Resolution::Unmatched)
}

/// [`resolve`] bounded by `deadline`; the pending query is dropped on expiry.
pub async fn resolve_within<S: MembershipStore>(
    store: &S,
    identity: &str,
    rules: &RuleSet,
    deadline: Duration,
) -> Result<Resolution, ResolveError> {
    with_deadline(deadline, resolve(store, identity, rules)).await
}
