//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Resolution against the membership store:
//!     → timeouts.rs (enforce resolve deadline)
//!     → On timeout: resolution fails with 504, never falls back to default
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every store call has a deadline
//! - No automatic retries: a failed lookup is surfaced, not replayed

pub mod timeouts;
