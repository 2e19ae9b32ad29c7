//! Environment variable names read by
//! [`LoggerConfig::from_env`](crate::config::LoggerConfig::from_env).
//!
//! These are purely helpers; loggers can always be configured in code.

/// Minimum severity that reaches the sink, e.g. `Information` or `warn`.
pub const LOG_FACADE_MIN_LEVEL_ENV: &str = "LOG_FACADE_MIN_LEVEL";

/// Maximum number of links followed along an error's cause chain.
pub const LOG_FACADE_MAX_EXCEPTION_DEPTH_ENV: &str = "LOG_FACADE_MAX_EXCEPTION_DEPTH";

/// Read an environment variable, treating unset and blank as absent.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
