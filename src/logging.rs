//! Logging initialization
//!
//! Logs always go to stderr; stdout carries the tool's output. `RUST_LOG`
//! overrides the default filter.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output
    Cli,
    /// JSON structured output
    Json,
    /// No output; tests install their own subscriber
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Default filter directive: warnings only, or debug with `-v`
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "repack=debug"
    } else {
        "repack=warn"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)))
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init(profile: Profile, verbose: bool) {
    INIT_ONCE.call_once(|| {
        let result = match profile {
            Profile::Cli => tracing_subscriber::fmt()
                .with_env_filter(env_filter(verbose))
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish()
                .try_init(),
            Profile::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter(verbose))
                .with_writer(std::io::stderr)
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
        // another subscriber was installed first (e.g. by a test harness)
        drop(result);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test, false);
        init(Profile::Cli, true);
        init(Profile::Json, false);
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "repack=warn");
        assert_eq!(default_filter(true), "repack=debug");
    }
}
