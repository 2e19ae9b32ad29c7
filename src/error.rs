use crate::level::{ParseSeverityError, Severity};
use crate::sink::SinkError;

/// Error returned by the logging operations.
///
/// Dropped calls are not errors; the only failure a caller can observe is
/// the sink rejecting a record.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("log sink failed to deliver {level} record")]
    Sink {
        level: Severity,
        #[source]
        source: SinkError,
    },

    #[error("log sink failed to flush")]
    Flush(#[source] SinkError),
}

/// Error raised while reading [`LoggerConfig`](crate::config::LoggerConfig)
/// from the environment.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {source}")]
    Severity {
        var: &'static str,
        #[source]
        source: ParseSeverityError,
    },

    #[error("invalid value for {var}: {value:?} is not a positive integer")]
    Depth { var: &'static str, value: String },
}
