//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (request_id, identity, table) on every event
//! - Request ID flows from the HTTP layer into resolution logs
//! - Metrics are cheap (atomic increments) and always recorded; the
//!   exporter is optional

pub mod logging;
pub mod metrics;
