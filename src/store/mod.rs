//! Membership store subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver
//!     → MembershipStore::open_session (one pooled connection per request)
//!     → MembershipSession::count_members (one query per rule examined)
//!     → session dropped, connection returned to the pool
//! ```
//!
//! # Design Decisions
//! - The resolver only sees these traits; `sql.rs` is the production backend
//! - Identities are always bound as parameters, never spliced into SQL
//! - Table and column names cannot be bound, so they must pass
//!   [`is_valid_identifier`] before they reach a store

pub mod sql;

use std::future::Future;

use thiserror::Error;

pub use sql::SqlStore;

/// Boxed error produced by a store backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No session could be established with the store.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] BoxError),

    /// A membership query failed.
    #[error("query failed: {0}")]
    Query(#[source] BoxError),
}

/// A source of sessions able to answer membership queries.
pub trait MembershipStore: Send + Sync + 'static {
    type Session: MembershipSession;

    /// Open the session that all queries of one resolution run on.
    fn open_session(&self) -> impl Future<Output = Result<Self::Session, StoreError>> + Send;
}

/// One logical session against the store.
pub trait MembershipSession: Send {
    /// Number of rows in `table` whose identity column equals `identity`.
    fn count_members(
        &mut self,
        table: &str,
        identity: &str,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

/// Returns true for `name` or `schema.name`, where each part matches
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(candidate: &str) -> bool {
    let mut parts = candidate.split('.');
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, None) => valid_part(name),
        (Some(schema), Some(name), None) => valid_part(schema) && valid_part(name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("users"));
        assert!(is_valid_identifier("_staff2"));
        assert!(is_valid_identifier("auth.users"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2users"));
        assert!(!is_valid_identifier("users;--"));
        assert!(!is_valid_identifier("a.b.c"));
        assert!(!is_valid_identifier("auth."));
        assert!(!is_valid_identifier("\"users\""));
    }
}
