//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (identity, path)
//!     → resolver.rs (walk table rules against the membership store)
//!     → Matched(destination) or Unmatched (→ default destination)
//!     → rewriter.rs (swap location prefix, trailing-slash check)
//!     → InternalRewrite(path) or ClientRedirect(path + "/")
//!
//! Table Compilation (at startup and on reload):
//!     RewriteConfig
//!     → rules.rs (parse ordered `table destination` pairs)
//!     → table.rs (freeze as immutable RoutingTable)
//! ```
//!
//! # Design Decisions
//! - Tables compiled at startup, immutable at runtime
//! - Deterministic: same identity and store contents give the same route
//! - First match wins (ordered by configuration)

pub mod resolver;
pub mod rewriter;
pub mod rules;
pub mod table;

pub use resolver::{resolve, resolve_within, Resolution, ResolveError};
pub use rewriter::{rewrite, RewriteDecision};
pub use rules::{Rule, RuleSet};
pub use table::RoutingTable;
