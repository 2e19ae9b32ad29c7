//! Structured logging facade.
//!
//! A [`Logger<T>`] turns each call into a [`LogRecord`] carrying the
//! caller, the ambient request context, a normalized error chain and the
//! call's parameters, then hands it to a pluggable [`LogSink`].

pub mod caller;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod exception;
pub mod level;
pub mod locale;
pub mod logger;
pub mod params;
pub mod record;
pub mod sink;

pub mod init;
pub mod memory_sink;
pub mod noop_sink;
pub mod tracing_sink;

#[cfg(feature = "json")]
pub mod json_sink;

pub use caller::{CallSite, CallSiteResolver, CallerResolver, MethodIdentity};
pub use config::LoggerConfig;
pub use context::{ContextFields, ContextProvider, RequestInfo, ThreadRequestContext};
pub use error::{ConfigError, LogError};
pub use exception::{ExceptionNode, Fault};
pub use level::Severity;
pub use locale::Locale;
pub use logger::Logger;
pub use params::ParameterBag;
pub use record::{LogEntry, LogRecord, LogRecordBuilder};
pub use sink::{LogSink, SinkError};
