//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → compiled into RoutingTable, shared via Arc
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<RoutingTable>
//!     → subsequent requests observe new rules
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults except the data source and rewrite location
//! - Validation separates syntactic (serde) from semantic checks
//! - Database settings are fixed for the process lifetime

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::DatabaseConfig;
pub use schema::ListenerConfig;
pub use schema::RewriteConfig;
pub use schema::RouterConfig;
