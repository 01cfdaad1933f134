// SPDX-License-Identifier: MIT

//! Tracing setup for the driver binary.
//!
//! Filters come from `RUST_LOG`; without it the driver logs warnings, or
//! everything down to `debug` with `--verbose`. Output goes to stderr so
//! the buffer printed on stdout stays clean.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install the tracing subscriber: {0}")]
    Install(String),
}

/// Default directive when `RUST_LOG` is unset.
#[must_use]
pub const fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Build the filter from `RUST_LOG`, falling back to [`default_directive`].
pub fn filter(verbose: bool) -> Result<EnvFilter, LoggingError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(spec) if !spec.trim().is_empty() => Ok(EnvFilter::try_new(spec)?),
        _ => Ok(EnvFilter::try_new(default_directive(verbose))?),
    }
}

/// Install the global subscriber.
pub fn init(verbose: bool) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| LoggingError::Install(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_the_default() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "debug");
    }

    #[test]
    fn bad_directives_are_reported() {
        assert!(matches!(EnvFilter::try_new("n_modal=loud").map_err(LoggingError::from), Err(LoggingError::Filter(_))));
    }
}
