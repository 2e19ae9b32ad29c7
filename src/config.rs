use crate::env::{env_opt, LOG_FACADE_MAX_EXCEPTION_DEPTH_ENV, LOG_FACADE_MIN_LEVEL_ENV};
use crate::error::ConfigError;
use crate::exception::DEFAULT_MAX_EXCEPTION_DEPTH;
use crate::level::Severity;

/// Logger configuration.
///
/// **Fields**
/// - `min_level`: calls below this severity are dropped before any
///   record is built.
/// - `max_exception_depth`: number of links followed along an error's
///   cause chain before it is truncated.
///
/// The formatting locale is not configurable: every call renders its
/// parameters under the invariant `en-US` locale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggerConfig {
    pub min_level: Severity,
    pub max_exception_depth: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: Severity::Trace,
            max_exception_depth: DEFAULT_MAX_EXCEPTION_DEPTH,
        }
    }
}

impl LoggerConfig {
    /// Read the configuration from the `LOG_FACADE_*` environment
    /// variables. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_opt)
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LoggerConfig::default();

        if let Some(raw) = lookup(LOG_FACADE_MIN_LEVEL_ENV) {
            config.min_level = raw.parse().map_err(|source| ConfigError::Severity {
                var: LOG_FACADE_MIN_LEVEL_ENV,
                source,
            })?;
        }

        if let Some(raw) = lookup(LOG_FACADE_MAX_EXCEPTION_DEPTH_ENV) {
            config.max_exception_depth = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|depth| *depth > 0)
                .ok_or(ConfigError::Depth {
                    var: LOG_FACADE_MAX_EXCEPTION_DEPTH_ENV,
                    value: raw,
                })?;
        }

        Ok(config)
    }

    pub fn with_min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    /// Depth cap for cause chains; values below one are raised to one.
    pub fn with_max_exception_depth(mut self, depth: usize) -> Self {
        self.max_exception_depth = depth.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = LoggerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LoggerConfig::default());
        assert_eq!(config.min_level, Severity::Trace);
        assert_eq!(config.max_exception_depth, 100);
    }

    #[test]
    fn reads_every_variable() {
        let config = LoggerConfig::from_lookup(lookup(&[
            ("LOG_FACADE_MIN_LEVEL", "warn"),
            ("LOG_FACADE_MAX_EXCEPTION_DEPTH", "8"),
        ]))
        .unwrap();

        assert_eq!(config.min_level, Severity::Warning);
        assert_eq!(config.max_exception_depth, 8);
    }

    #[test]
    fn locale_variable_has_no_effect() {
        let config = LoggerConfig::from_lookup(lookup(&[("LOG_FACADE_LOCALE", "de-DE")])).unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn rejects_invalid_values() {
        let err = LoggerConfig::from_lookup(lookup(&[("LOG_FACADE_MIN_LEVEL", "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::Severity { .. }));

        let err =
            LoggerConfig::from_lookup(lookup(&[("LOG_FACADE_MAX_EXCEPTION_DEPTH", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Depth { .. }));
    }

    #[test]
    fn depth_builder_enforces_minimum() {
        assert_eq!(LoggerConfig::default().with_max_exception_depth(0).max_exception_depth, 1);
    }
}
