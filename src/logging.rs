//! Structured logging setup.
//!
//! JSON output for production-style runs, pretty output for development,
//! selected via `LOG_FORMAT`; verbosity via the standard `RUST_LOG`
//! filter syntax.

use std::env;
use std::io;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT").unwrap_or_default().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize the global subscriber. Safe to call once per process.
pub fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_target(true)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).init();
        }
    }

    tracing::debug!(format = ?format, "logging initialized");
}
