use std::error::Error;
use std::sync::Arc;

use log_facade::{LogRecord, LogSink, Logger, ParameterBag, SinkError};

/// Example of integrating a custom backend by implementing the `LogSink`
/// trait directly. A real adapter would forward to its own client
/// library; this one prints the wire-format fields.
struct PrintSink;

impl LogSink for PrintSink {
    fn deliver(
        &self,
        record: &LogRecord,
        exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), SinkError> {
        println!(
            "[{}] {}::{}::{} {} {} {}",
            record.level,
            record.namespace,
            record.class_name,
            record.method_name,
            record.message,
            record.formatted_parameters,
            record.legacy_exception_text(),
        );
        if let Some(e) = exception {
            println!("  raw error: {e}");
        }
        Ok(())
    }
}

struct Importer;

fn main() -> Result<(), Box<dyn Error>> {
    let logger: Logger<Importer> = Logger::new(Arc::new(PrintSink));

    let params = ParameterBag::new().with("file", "users.csv").with("rows", 120);
    logger.information("import started", Some(&params))?;

    let err = "12x".parse::<u32>().unwrap_err();
    logger.error(Some(&err), Some("bad row"), Some(&params))?;

    // Blank calls are dropped and never reach the sink.
    logger.warning("", None)?;
    Ok(())
}
