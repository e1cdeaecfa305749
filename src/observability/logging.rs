//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level at runtime
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the built-in filter
//! - Full format for development, compact format for dense production logs

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::LogFormat;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "identity_router=info,tower_http=info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Full => registry.with(fmt::layer()).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
    }
}

/// Install a stderr subscriber for command-line tools, warnings and above
/// unless `RUST_LOG` says otherwise. Keeps stdout free for command output.
pub fn init_stderr_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
