//! Identity-based path routing library.
//!
//! Resolves an authenticated identity against an ordered list of database
//! tables and serves the request from the directory mapped to the first
//! matching table, without changing the URL the client sees.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod store;

pub use config::schema::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
