//! Logging setup for Tabula.
//!
//! Library code only emits `tracing` events. A subscriber is installed by
//! [`init`] when the `tracing-subscriber` feature is enabled and one of the
//! environment variables below asks for output.
//!
//! # Environment Variables
//!
//! - `TABULA_DEBUG=true|1|yes` - Enable debug logging
//! - `TABULA_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `TABULA_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use tabula_query::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Whether `TABULA_DEBUG` is set to a truthy value.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("TABULA_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The level from `TABULA_LOG_LEVEL`, falling back to `debug` when
/// `TABULA_DEBUG` is on and `warn` otherwise.
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("TABULA_LOG_LEVEL") {
        Ok(level) => {
            let level = level.to_lowercase();
            LEVELS
                .iter()
                .find(|l| **l == level)
                .copied()
                .unwrap_or(fallback)
        }
        Err(_) => fallback,
    }
}

/// The format from `TABULA_LOG_FORMAT`. Defaults to `json`.
pub fn get_log_format() -> &'static str {
    env::var("TABULA_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Install the global subscriber. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("TABULA_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "tabula={},tabula_query={},tabula_migrate={},tabula_mysql={}",
                level, level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            match get_log_format() {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
            }

            tracing::info!(
                level = level,
                format = get_log_format(),
                "Tabula logging initialized"
            );
        }
    });
}

/// Set `TABULA_LOG_LEVEL` and call [`init`].
///
/// # Safety
///
/// Modifies the process environment. Call at startup before spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: called at program startup before other threads exist.
    unsafe {
        env::set_var("TABULA_LOG_LEVEL", level);
    }
    init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // SAFETY: test-local environment
        unsafe {
            env::remove_var("TABULA_DEBUG");
            env::remove_var("TABULA_LOG_LEVEL");
            env::remove_var("TABULA_LOG_FORMAT");
        }
        assert!(!is_debug_enabled());
        assert_eq!(get_log_level(), "warn");
        assert_eq!(get_log_format(), "json");
    }
}
