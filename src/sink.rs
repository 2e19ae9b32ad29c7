use crate::record::LogRecord;
use std::error::Error;
use std::sync::Arc;

/// Error type returned by sinks.
pub type SinkError = Box<dyn Error + Send + Sync>;

/// Destination for finished [`LogRecord`]s.
///
/// Implementations adapt records to a concrete backend (console, file,
/// `tracing`, a third-party logger). The logger calls `deliver` once per
/// accepted call, synchronously on the calling thread, with the current
/// locale forced to the logger's formatting locale.
pub trait LogSink: Send + Sync {
    /// Deliver a single record.
    ///
    /// **Parameters**
    /// - `record`: fully-populated [`LogRecord`] built for this call.
    /// - `exception`: the original error the record's exception tree was
    ///   normalized from, for sinks that want the live value.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the record.
    /// - `Err(..)` if it failed. The error is passed back to the caller of
    ///   the logging operation; nothing is retried.
    fn deliver(
        &self,
        record: &LogRecord,
        exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), SinkError>;

    /// Flush buffered output, if the backend buffers.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn deliver(
        &self,
        record: &LogRecord,
        exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), SinkError> {
        (**self).deliver(record, exception)
    }

    fn flush(&self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn deliver(
        &self,
        record: &LogRecord,
        exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), SinkError> {
        (**self).deliver(record, exception)
    }

    fn flush(&self) -> Result<(), SinkError> {
        (**self).flush()
    }
}
