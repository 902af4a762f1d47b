//! Shared tracing/logging initialization.
//!
//! The `storefront` binary and embedding hosts set up `tracing_subscriber`
//! the same way: an env-filter plus optional JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter: `RUST_LOG` wins, then `default_filter`.
pub fn env_filter(default_filter: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter))
}

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- default `RUST_LOG` value when the env-var is not set
///   (e.g. `"storefront=info"`).
/// * `log_json` -- when `true`, emit structured JSON log lines instead of the
///   human-readable format.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Calling this twice is a no-op.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let filter = env_filter(default_filter);
    let result = if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Default filter for a configured log level, e.g. `info` -> `storefront=info,...`.
pub fn default_filter_for(level: &str) -> String {
    format!(
        "storefront={level},storefront_cli={level},storefront_core={level},storefront_crypto={level}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_all_crates() {
        let filter = default_filter_for("debug");
        assert!(filter.contains("storefront_core=debug"));
        assert!(filter.contains("storefront_crypto=debug"));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing("warn", false);
        init_tracing("warn", true);
    }
}
