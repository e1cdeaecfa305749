//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, authenticated identity)
//!     → [routing layer resolves identity and rewrites path]
//!     → response.rs (redirects, error mapping)
//!     → ServeDir for internal rewrites
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::HttpServer;
