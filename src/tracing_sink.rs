use crate::level::Severity;
use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use std::error::Error;

/// Sink that re-emits records as `tracing` events.
///
/// The record fields travel as structured event fields; `Critical` is
/// emitted at `ERROR` with `critical = true`. Pair it with
/// [`init_tracing`](crate::init::init_tracing) to get console output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

macro_rules! emit {
    ($level:expr, $record:expr) => {{
        let record: &LogRecord = $record;
        let exceptions = record.legacy_exception_text();
        let critical = record.level == Severity::Critical;
        tracing::event!(
            target: "log_facade",
            $level,
            namespace = %record.namespace,
            class_name = %record.class_name,
            method_name = %record.method_name,
            method_name_received = %record.method_name_received,
            remote_address = %record.remote_address,
            username = %record.username,
            request_path = %record.request_path,
            http_referrer = %record.http_referrer,
            parameters = %record.formatted_parameters,
            exceptions = %exceptions,
            data = record.attached_data_json.as_deref(),
            critical,
            "{}",
            record.message
        );
    }};
}

impl LogSink for TracingSink {
    fn deliver(
        &self,
        record: &LogRecord,
        _exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), SinkError> {
        match record.level {
            Severity::Trace => emit!(tracing::Level::TRACE, record),
            Severity::Debug => emit!(tracing::Level::DEBUG, record),
            Severity::Information => emit!(tracing::Level::INFO, record),
            Severity::Warning => emit!(tracing::Level::WARN, record),
            Severity::Error | Severity::Critical => emit!(tracing::Level::ERROR, record),
        }
        Ok(())
    }
}
