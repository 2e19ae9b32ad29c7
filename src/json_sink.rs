use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use std::error::Error;
use std::io::{self, Write};
use std::sync::Mutex;

/// Sink writing one JSON document per record to any [`Write`]r.
///
/// Blank text fields are written as `"NULL"`. The writer is guarded by
/// a mutex, so a single sink can be shared between threads.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
    pretty: bool,
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        JsonLinesSink::new(io::stdout())
    }
}

impl JsonLinesSink<io::Stderr> {
    pub fn stderr() -> Self {
        JsonLinesSink::new(io::stderr())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink {
            writer: Mutex::new(writer),
            pretty: false,
        }
    }

    /// Write indented multi-line documents instead of single lines.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Recover the writer, e.g. to inspect an in-memory buffer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> LogSink for JsonLinesSink<W> {
    fn deliver(
        &self,
        record: &LogRecord,
        _exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), SinkError> {
        let doc = if self.pretty {
            record.to_json()
        } else {
            record.to_json_line()
        };

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| "json sink writer lock poisoned")?;
        writeln!(writer, "{doc}")?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| "json sink writer lock poisoned")?;
        writer.flush()?;
        Ok(())
    }
}
