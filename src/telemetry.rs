//! Tracing setup.
//!
//! Both binaries call [`init`] exactly once at startup. The filter
//! defaults to the configured `LogConfig::level` but still honors
//! `RUST_LOG` if set, so an operator can override verbosity for a single
//! run without touching configuration.

use crate::config::LogConfig;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log.level.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
