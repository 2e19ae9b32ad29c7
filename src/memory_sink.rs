use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};

/// Sink that keeps every delivered record in memory.
///
/// Clones share the same buffer, so a test can hand one clone to a
/// logger and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the delivered records, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn last(&self) -> Option<LogRecord> {
        self.lock().last().cloned()
    }

    /// Remove and return everything delivered so far.
    pub fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemorySink {
    fn deliver(
        &self,
        record: &LogRecord,
        _exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), SinkError> {
        self.lock().push(record.clone());
        Ok(())
    }
}
