use crate::caller::{self, CallSite, CallSiteResolver, CallerResolver};
use crate::config::LoggerConfig;
use crate::context::ContextProvider;
use crate::error::LogError;
use crate::level::Severity;
use crate::locale::{self, Locale};
use crate::params::ParameterBag;
use crate::record::{LogEntry, LogRecordBuilder};
use crate::sink::LogSink;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Namespace recorded when the owner type has no module path.
pub const UNKNOWN_NAMESPACE: &str = "Unknown Namespace";

/// Logging entry point for code owned by `T`.
///
/// Records are attributed to `T`: its module path becomes the record's
/// namespace and its type name the class name. Every call resolves the
/// caller, builds a [`LogRecord`](crate::record::LogRecord), and hands it
/// to the sink with the invariant `en-US` locale installed on the calling
/// thread, whatever locale the thread had before.
///
/// Prefer the `log_*!` macros: they pass the enclosing function path, which
/// the default resolver turns into the record's method name. Calls through
/// the plain methods only know their source location, so their method name
/// is `file:line`.
///
/// A call is dropped (returns `Ok(())` without touching the sink) when the
/// caller cannot be resolved, when it carries neither a non-blank message
/// nor an error, or when its severity is below the configured minimum.
pub struct Logger<T: ?Sized> {
    sink: Arc<dyn LogSink>,
    context: Option<Arc<dyn ContextProvider>>,
    resolver: Arc<dyn CallerResolver>,
    config: LoggerConfig,
    namespace: String,
    class_name: String,
    _owner: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized> Logger<T> {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        let type_path = std::any::type_name::<T>();
        Logger {
            sink,
            context: None,
            resolver: Arc::new(CallSiteResolver),
            config: LoggerConfig::default(),
            namespace: caller::parent_path(type_path)
                .unwrap_or(UNKNOWN_NAMESPACE)
                .to_string(),
            class_name: caller::short_name(type_path).to_string(),
            _owner: PhantomData,
        }
    }

    pub fn with_context(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context = Some(provider);
        self
    }

    pub fn with_resolver(mut self, resolver: impl CallerResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Logger for another owner type sharing this one's sink, context
    /// provider, resolver and configuration.
    pub fn for_owner<U: ?Sized>(&self) -> Logger<U> {
        Logger::<U>::new(Arc::clone(&self.sink))
            .with_config(self.config.clone())
            .with_shared_parts(self.context.clone(), Arc::clone(&self.resolver))
    }

    fn with_shared_parts(
        mut self,
        context: Option<Arc<dyn ContextProvider>>,
        resolver: Arc<dyn CallerResolver>,
    ) -> Self {
        self.context = context;
        self.resolver = resolver;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    #[track_caller]
    pub fn trace(&self, message: &str, parameters: Option<&ParameterBag>) -> Result<(), LogError> {
        self.log(message_entry(Severity::Trace, message, parameters))
    }

    #[track_caller]
    pub fn debug(&self, message: &str, parameters: Option<&ParameterBag>) -> Result<(), LogError> {
        self.log(message_entry(Severity::Debug, message, parameters))
    }

    #[track_caller]
    pub fn information(
        &self,
        message: &str,
        parameters: Option<&ParameterBag>,
    ) -> Result<(), LogError> {
        self.log(message_entry(Severity::Information, message, parameters))
    }

    #[track_caller]
    pub fn warning(&self, message: &str, parameters: Option<&ParameterBag>) -> Result<(), LogError> {
        self.log(message_entry(Severity::Warning, message, parameters))
    }

    #[track_caller]
    pub fn error(
        &self,
        exception: Option<&(dyn Error + 'static)>,
        message: Option<&str>,
        parameters: Option<&ParameterBag>,
    ) -> Result<(), LogError> {
        self.log(failure_entry(Severity::Error, exception, message, parameters))
    }

    #[track_caller]
    pub fn critical(
        &self,
        exception: Option<&(dyn Error + 'static)>,
        message: Option<&str>,
        parameters: Option<&ParameterBag>,
    ) -> Result<(), LogError> {
        self.log(failure_entry(Severity::Critical, exception, message, parameters))
    }

    /// [`error`](Self::error) with a concretely typed error; the outermost
    /// exception node is named after `E` instead of a guess.
    #[track_caller]
    pub fn error_typed<E: Error + 'static>(
        &self,
        exception: &E,
        message: Option<&str>,
        parameters: Option<&ParameterBag>,
    ) -> Result<(), LogError> {
        self.log(typed_failure_entry(Severity::Error, exception, message, parameters))
    }

    /// [`critical`](Self::critical) with a concretely typed error.
    #[track_caller]
    pub fn critical_typed<E: Error + 'static>(
        &self,
        exception: &E,
        message: Option<&str>,
        parameters: Option<&ParameterBag>,
    ) -> Result<(), LogError> {
        self.log(typed_failure_entry(Severity::Critical, exception, message, parameters))
    }

    /// Log a fully described entry from the caller's location.
    #[track_caller]
    pub fn log(&self, entry: LogEntry<'_>) -> Result<(), LogError> {
        let site = CallSite::here(entry.function);
        self.log_at(&site, entry)
    }

    /// Log an entry attributed to an explicit call site.
    pub fn log_at(&self, site: &CallSite, entry: LogEntry<'_>) -> Result<(), LogError> {
        let Some(caller) = self.resolver.resolve(site) else {
            tracing::debug!(
                file = site.location.file(),
                line = site.location.line(),
                "caller could not be resolved; dropping log call"
            );
            return Ok(());
        };

        if entry.is_blank() {
            tracing::debug!(method = %caller.name, "log call without message or error; dropping it");
            return Ok(());
        }

        if entry.level < self.config.min_level {
            return Ok(());
        }

        let invariant = Locale::invariant();
        let _locale = locale::override_current(invariant.clone());

        let record = LogRecordBuilder::new(&self.namespace, &self.class_name, &invariant)
            .with_context(self.context.as_deref())
            .with_max_exception_depth(self.config.max_exception_depth)
            .build(&entry, &caller);

        self.sink
            .deliver(&record, entry.exception)
            .map_err(|source| LogError::Sink {
                level: entry.level,
                source,
            })
    }

    /// Flush the underlying sink.
    pub fn flush(&self) -> Result<(), LogError> {
        self.sink.flush().map_err(LogError::Flush)
    }
}

fn message_entry<'a>(
    level: Severity,
    message: &'a str,
    parameters: Option<&'a ParameterBag>,
) -> LogEntry<'a> {
    let mut entry = LogEntry::new(level).message(message);
    entry.parameters = parameters;
    entry
}

fn failure_entry<'a>(
    level: Severity,
    exception: Option<&'a (dyn Error + 'static)>,
    message: Option<&'a str>,
    parameters: Option<&'a ParameterBag>,
) -> LogEntry<'a> {
    let mut entry = LogEntry::new(level);
    entry.exception = exception;
    entry.message = message;
    entry.parameters = parameters;
    entry
}

fn typed_failure_entry<'a, E: Error + 'static>(
    level: Severity,
    exception: &'a E,
    message: Option<&'a str>,
    parameters: Option<&'a ParameterBag>,
) -> LogEntry<'a> {
    let mut entry = LogEntry::new(level).exception(exception);
    entry.message = message;
    entry.parameters = parameters;
    entry
}

impl<T: ?Sized> Clone for Logger<T> {
    fn clone(&self) -> Self {
        Logger {
            sink: Arc::clone(&self.sink),
            context: self.context.clone(),
            resolver: Arc::clone(&self.resolver),
            config: self.config.clone(),
            namespace: self.namespace.clone(),
            class_name: self.class_name.clone(),
            _owner: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Logger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("namespace", &self.namespace)
            .field("class_name", &self.class_name)
            .field("config", &self.config)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_message {
    ($level:ident, $logger:expr, $msg:expr $(, $params:expr)?) => {
        $logger.log(
            $crate::LogEntry::new($crate::Severity::$level)
                .message($msg)
                $(.parameters($params))?
                .function($crate::function_path!()),
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_failure {
    ($level:ident, $logger:expr, $err:expr $(, $msg:expr $(, $params:expr)?)?) => {
        $logger.log(
            $crate::LogEntry::new($crate::Severity::$level)
                .exception($err)
                $(.message($msg) $(.parameters($params))?)?
                .function($crate::function_path!()),
        )
    };
}

/// `log_trace!(logger, message [, &parameters])`, recording the enclosing
/// function as the received method name.
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $msg:expr $(, $params:expr)? $(,)?) => {
        $crate::__log_message!(Trace, $logger, $msg $(, $params)?)
    };
}

/// `log_debug!(logger, message [, &parameters])`
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $msg:expr $(, $params:expr)? $(,)?) => {
        $crate::__log_message!(Debug, $logger, $msg $(, $params)?)
    };
}

/// `log_information!(logger, message [, &parameters])`
#[macro_export]
macro_rules! log_information {
    ($logger:expr, $msg:expr $(, $params:expr)? $(,)?) => {
        $crate::__log_message!(Information, $logger, $msg $(, $params)?)
    };
}

/// `log_warning!(logger, message [, &parameters])`
#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $msg:expr $(, $params:expr)? $(,)?) => {
        $crate::__log_message!(Warning, $logger, $msg $(, $params)?)
    };
}

/// `log_error!(logger, &error [, message [, &parameters]])`
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $err:expr $(, $msg:expr $(, $params:expr)?)? $(,)?) => {
        $crate::__log_failure!(Error, $logger, $err $(, $msg $(, $params)?)?)
    };
}

/// `log_critical!(logger, &error [, message [, &parameters]])`
#[macro_export]
macro_rules! log_critical {
    ($logger:expr, $err:expr $(, $msg:expr $(, $params:expr)?)? $(,)?) => {
        $crate::__log_failure!(Critical, $logger, $err $(, $msg $(, $params)?)?)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::MethodIdentity;
    use crate::context::RequestInfo;
    use crate::exception::Fault;
    use crate::locale::Locale;
    use crate::memory_sink::MemorySink;
    use crate::record::LogRecord;
    use crate::sink::SinkError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct OrderService;

    /// Sink that records the locale it observed and then fails.
    #[derive(Default)]
    struct FailingSink {
        calls: AtomicUsize,
        seen_locale: Mutex<Option<Locale>>,
    }

    impl LogSink for FailingSink {
        fn deliver(
            &self,
            _record: &LogRecord,
            _exception: Option<&(dyn Error + 'static)>,
        ) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_locale.lock().unwrap() = Some(locale::current());
            Err("backend unavailable".into())
        }
    }

    struct PanickingSink;

    impl LogSink for PanickingSink {
        fn deliver(
            &self,
            _record: &LogRecord,
            _exception: Option<&(dyn Error + 'static)>,
        ) -> Result<(), SinkError> {
            panic!("sink panicked");
        }
    }

    fn memory_logger() -> (Logger<OrderService>, MemorySink) {
        let sink = MemorySink::new();
        (Logger::new(Arc::new(sink.clone())), sink)
    }

    #[test]
    fn owner_type_sets_namespace_and_class() {
        let (logger, _) = memory_logger();
        assert_eq!(logger.namespace(), "log_facade::logger::tests");
        assert_eq!(logger.class_name(), "OrderService");

        let unit: Logger<()> = logger.for_owner();
        assert_eq!(unit.namespace(), UNKNOWN_NAMESPACE);
        assert_eq!(unit.class_name(), "()");
    }

    #[test]
    fn blank_calls_never_reach_the_sink() {
        let (logger, sink) = memory_logger();
        logger.information("", None).unwrap();
        logger.warning("   ", None).unwrap();
        logger.error(None, None, None).unwrap();
        logger.critical(None, Some(" "), None).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn each_accepted_call_delivers_exactly_once() {
        let (logger, sink) = memory_logger();
        logger.trace("t", None).unwrap();
        logger.debug("d", None).unwrap();
        logger.information("i", None).unwrap();
        logger.warning("w", None).unwrap();

        let err = Fault::new("Timeout", "upstream timed out");
        logger.error(Some(&err), None, None).unwrap();
        logger.critical(Some(&err), Some("giving up"), None).unwrap();

        let levels: Vec<Severity> = sink.records().iter().map(|r| r.level).collect();
        assert_eq!(levels, Severity::ALL.to_vec());

        let last = sink.last().unwrap();
        assert_eq!(last.message, "giving up");
        assert_eq!(last.legacy_exception_text(), "<Exception>upstream timed out</Exception>");
    }

    #[test]
    fn plain_methods_attribute_to_the_call_location() {
        let (logger, sink) = memory_logger();
        let (result, line) = (logger.information("hello", None), line!());
        result.unwrap();

        let record = sink.last().unwrap();
        assert_eq!(record.method_name, format!("{}:{}", file!(), line));
        assert_eq!(record.method_name_received, "");
    }

    #[test]
    fn macros_record_the_enclosing_function() {
        let (logger, sink) = memory_logger();
        let bag = ParameterBag::new().with("order_id", 7);
        crate::log_information!(logger, "placed", &bag).unwrap();

        let record = sink.last().unwrap();
        assert_eq!(record.method_name, "macros_record_the_enclosing_function");
        assert_eq!(
            record.method_name_received,
            "log_facade::logger::tests::macros_record_the_enclosing_function"
        );
        assert_eq!(
            record.formatted_parameters,
            "<parameter><key>order_id</key><value>7</value></parameter>"
        );

        let err = Fault::new("E", "bad");
        crate::log_error!(logger, &err).unwrap();
        crate::log_critical!(logger, &err, "worse").unwrap();
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.last().unwrap().level, Severity::Critical);
    }

    #[test]
    fn unresolved_caller_drops_the_call() {
        let (logger, sink) = memory_logger();
        let logger = logger.with_resolver(|_: &CallSite| -> Option<MethodIdentity> { None });
        logger.information("hello", None).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn calls_below_min_level_are_dropped() {
        let (logger, sink) = memory_logger();
        let logger = logger.with_config(LoggerConfig::default().with_min_level(Severity::Warning));
        logger.debug("noise", None).unwrap();
        logger.warning("signal", None).unwrap();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn context_provider_feeds_the_record() {
        let (logger, sink) = memory_logger();
        let logger = logger.with_context(Arc::new(RequestInfo::new().with_username("alice")));
        logger.information("hi", None).unwrap();

        let record = sink.last().unwrap();
        assert_eq!(record.username, "alice");
        assert_eq!(record.remote_address, "Unknown RemoteIP");
    }

    #[test]
    fn sink_failure_propagates_and_restores_locale() {
        let sink = Arc::new(FailingSink::default());
        let logger: Logger<OrderService> = Logger::new(sink.clone());

        let before = locale::set_current("fa-IR".parse().unwrap());
        let result = logger.information("hello", None);
        let after = locale::current();
        locale::set_current(before);

        assert!(matches!(result, Err(LogError::Sink { level: Severity::Information, .. })));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
        assert_eq!(after.tag(), "fa-IR");
        assert!(sink.seen_locale.lock().unwrap().as_ref().unwrap().is_invariant());
    }

    #[test]
    fn sink_panic_still_restores_locale() {
        let logger: Logger<OrderService> = Logger::new(Arc::new(PanickingSink));

        let before = locale::set_current("de-DE".parse().unwrap());
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = logger.information("hello", None);
        }));
        let after = locale::current();
        locale::set_current(before);

        assert!(outcome.is_err());
        assert_eq!(after.tag(), "de-DE");
    }

    #[test]
    fn dropped_calls_leave_the_locale_alone() {
        let (logger, _) = memory_logger();
        let before = locale::set_current("it-IT".parse().unwrap());
        logger.information("", None).unwrap();
        let after = locale::current();
        locale::set_current(before);
        assert_eq!(after.tag(), "it-IT");
    }

    /// Sink that keeps the parameters it received and the thread locale
    /// active while it ran.
    #[derive(Default)]
    struct LocaleObservingSink {
        seen: Mutex<Vec<(String, String)>>,
    }

    impl LogSink for LocaleObservingSink {
        fn deliver(
            &self,
            record: &LogRecord,
            _exception: Option<&(dyn Error + 'static)>,
        ) -> Result<(), SinkError> {
            let tag = locale::current().tag().to_string();
            self.seen
                .lock()
                .unwrap()
                .push((record.formatted_parameters.clone(), tag));
            Ok(())
        }
    }

    #[test]
    fn wire_format_ignores_the_thread_locale() {
        let sink = Arc::new(LocaleObservingSink::default());
        let logger: Logger<OrderService> = Logger::new(sink.clone());
        let bag = ParameterBag::new().with("ratio", 0.5);

        let before = locale::set_current("de-DE".parse().unwrap());
        logger.information("ratio", Some(&bag)).unwrap();
        let after = locale::current();
        locale::set_current(before);

        let seen = sink.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            (
                "<parameter><key>ratio</key><value>0.5</value></parameter>".to_string(),
                "en-US".to_string()
            )
        );
        assert_eq!(after.tag(), "de-DE");
    }

    #[derive(Debug, thiserror::Error)]
    enum InventoryError {
        #[error("item {0} out of stock")]
        OutOfStock(u32),
    }

    #[test]
    fn typed_errors_are_named_after_their_type() {
        let (logger, sink) = memory_logger();
        let err = InventoryError::OutOfStock(4);

        logger.error_typed(&err, Some("reserve failed"), None).unwrap();
        crate::log_critical!(logger, &err).unwrap();
        logger.error(Some(&err), None, None).unwrap();

        let names: Vec<String> = sink
            .records()
            .iter()
            .map(|r| r.exception_tree.as_ref().unwrap().type_name.clone())
            .collect();
        let full = std::any::type_name::<InventoryError>().to_string();
        assert_eq!(names, vec![full.clone(), full, "OutOfStock".to_string()]);
    }

    #[test]
    fn attached_data_flows_through_log() {
        let (logger, sink) = memory_logger();
        logger
            .log(LogEntry::new(Severity::Information).message("with data").data(&[1, 2, 3]))
            .unwrap();
        assert_eq!(sink.last().unwrap().attached_data_json.as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn logger_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Logger<OrderService>>();
        assert_send_sync::<Logger<dyn std::any::Any>>();
    }
}
