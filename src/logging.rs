//! `tracing` setup for the `gocd` binary and for embedders of the provider.
//!
//! Logs go to stderr; stdout carries only rendered command output. `RUST_LOG`
//! overrides the default level:
//!
//! ```bash
//! RUST_LOG=gocd_provider=debug gocd list-agents
//! ```

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used by [`init_logging`] when `RUST_LOG` is unset.
pub const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber at [`DEFAULT_LEVEL`].
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LEVEL);
}

/// Install the global subscriber, using `default_level` unless `RUST_LOG` is set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Like [`init_logging_with_default`], but returns false instead of
/// panicking when a subscriber is already installed.
pub fn try_init_logging(default_level: &str) -> bool {
    subscriber(default_level).try_init().is_ok()
}

fn subscriber(default_level: &str) -> impl Subscriber + Send + Sync {
    let stderr = std::io::stderr();
    let ansi = stderr.is_terminal();
    tracing_subscriber::registry().with(env_filter(default_level)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .compact(),
    )
}

/// `RUST_LOG` if it parses, else `default_level`, else [`DEFAULT_LEVEL`].
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}
