use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use std::error::Error;

/// A sink that simply drops all records.
///
/// Useful for measuring the cost of record assembly without any output,
/// and for code paths that must hold a logger but don't care about it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn deliver(
        &self,
        _record: &LogRecord,
        _exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}
