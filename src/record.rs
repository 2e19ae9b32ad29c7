use crate::caller::MethodIdentity;
use crate::context::{ContextFields, ContextProvider};
use crate::exception::{self, ExceptionNode, DEFAULT_MAX_EXCEPTION_DEPTH};
use crate::level::Severity;
use crate::locale::Locale;
use crate::params::{self, ParameterBag};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;

/// Text substituted for blank fields in [`LogRecord::to_json`].
pub const NULL_FIELD: &str = "NULL";

/// Fully populated log record handed to a [`LogSink`](crate::sink::LogSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Severity,
    pub namespace: String,
    pub class_name: String,
    pub method_name: String,
    pub method_name_received: String,
    pub remote_address: String,
    pub username: String,
    pub request_path: String,
    pub http_referrer: String,
    pub message: String,
    pub formatted_parameters: String,
    pub exception_tree: Option<ExceptionNode>,
    pub attached_data_json: Option<String>,
}

impl LogRecord {
    /// Flattened `<Exception>..</Exception><InnerException>..` text of the
    /// exception tree, empty when there is none.
    pub fn legacy_exception_text(&self) -> String {
        self.exception_tree
            .as_ref()
            .map(ExceptionNode::to_legacy_text)
            .unwrap_or_default()
    }

    /// Pretty JSON document in which blank text fields read `"NULL"`.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.view()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Single-line variant of [`to_json`](Self::to_json).
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(&self.view()).unwrap_or_else(|_| "{}".to_string())
    }

    fn view(&self) -> RecordView<'_> {
        RecordView {
            timestamp: self.timestamp.to_rfc3339(),
            level: self.level.name(),
            namespace: or_null(&self.namespace),
            class_name: or_null(&self.class_name),
            method_name: or_null(&self.method_name),
            method_name_received: or_null(&self.method_name_received),
            remote_address: or_null(&self.remote_address),
            request_path: or_null(&self.request_path),
            http_referrer: or_null(&self.http_referrer),
            username: or_null(&self.username),
            message: or_null(&self.message),
            exceptions: self.exception_tree.as_ref(),
            parameters: or_null(&self.formatted_parameters),
            data: self
                .attached_data_json
                .as_deref()
                .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))),
        }
    }
}

#[derive(Serialize)]
struct RecordView<'a> {
    timestamp: String,
    level: &'static str,
    namespace: &'a str,
    class_name: &'a str,
    method_name: &'a str,
    method_name_received: &'a str,
    remote_address: &'a str,
    request_path: &'a str,
    http_referrer: &'a str,
    username: &'a str,
    message: &'a str,
    exceptions: Option<&'a ExceptionNode>,
    parameters: &'a str,
    data: Option<Value>,
}

fn or_null(value: &str) -> &str {
    if value.trim().is_empty() {
        NULL_FIELD
    } else {
        value
    }
}

/// Raw inputs of a single logging call.
#[derive(Debug, Clone)]
pub struct LogEntry<'a> {
    pub level: Severity,
    pub message: Option<&'a str>,
    pub exception: Option<&'a (dyn Error + 'static)>,
    /// Rust type name of `exception`, when it was attached by type.
    pub exception_type: Option<&'static str>,
    pub parameters: Option<&'a ParameterBag>,
    pub data: Option<Value>,
    /// Function path received from the call site, if any.
    pub function: Option<&'static str>,
}

impl<'a> LogEntry<'a> {
    pub fn new(level: Severity) -> Self {
        LogEntry {
            level,
            message: None,
            exception: None,
            exception_type: None,
            parameters: None,
            data: None,
            function: None,
        }
    }

    pub fn message(mut self, message: &'a str) -> Self {
        self.message = Some(message);
        self
    }

    /// Attach an error, recording `E` as the type name of the outermost
    /// exception node.
    pub fn exception<E: Error + 'static>(mut self, exception: &'a E) -> Self {
        self.exception = Some(exception);
        self.exception_type = Some(std::any::type_name::<E>());
        self
    }

    /// Attach an error whose concrete type is erased.
    pub fn exception_dyn(mut self, exception: &'a (dyn Error + 'static)) -> Self {
        self.exception = Some(exception);
        self.exception_type = None;
        self
    }

    pub fn parameters(mut self, parameters: &'a ParameterBag) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Attach an arbitrary payload, stored in the record as JSON text.
    /// A payload that cannot be serialized is skipped with a warning.
    pub fn data<T: Serialize + ?Sized>(mut self, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "attached log data could not be serialized; dropping it");
                self.data = None;
            }
        }
        self
    }

    pub fn function(mut self, function: &'static str) -> Self {
        self.function = Some(function);
        self
    }

    /// A call carrying neither an exception nor a non-blank message.
    pub fn is_blank(&self) -> bool {
        self.exception.is_none() && self.message.map_or(true, |m| m.trim().is_empty())
    }
}

/// Assembles [`LogRecord`]s for one owner type.
pub struct LogRecordBuilder<'a> {
    namespace: &'a str,
    class_name: &'a str,
    locale: &'a Locale,
    context: Option<&'a dyn ContextProvider>,
    max_exception_depth: usize,
}

impl<'a> LogRecordBuilder<'a> {
    pub fn new(namespace: &'a str, class_name: &'a str, locale: &'a Locale) -> Self {
        LogRecordBuilder {
            namespace,
            class_name,
            locale,
            context: None,
            max_exception_depth: DEFAULT_MAX_EXCEPTION_DEPTH,
        }
    }

    pub fn with_context(mut self, context: Option<&'a dyn ContextProvider>) -> Self {
        self.context = context;
        self
    }

    pub fn with_max_exception_depth(mut self, depth: usize) -> Self {
        self.max_exception_depth = depth;
        self
    }

    /// Build the record. Missing optional inputs become empty or sentinel
    /// fields; this never fails.
    pub fn build(&self, entry: &LogEntry<'_>, caller: &MethodIdentity) -> LogRecord {
        let context = ContextFields::capture(self.context);

        LogRecord {
            timestamp: Utc::now(),
            level: entry.level,
            namespace: self.namespace.to_string(),
            class_name: self.class_name.to_string(),
            method_name: caller.name.clone(),
            method_name_received: entry.function.unwrap_or_default().to_string(),
            remote_address: context.remote_address,
            username: context.username,
            request_path: context.request_path,
            http_referrer: context.http_referrer,
            message: entry.message.unwrap_or_default().to_string(),
            formatted_parameters: params::format_parameters(entry.parameters, self.locale),
            exception_tree: exception::normalize_named(
                entry.exception,
                entry.exception_type,
                self.max_exception_depth,
            ),
            attached_data_json: entry.data.as_ref().map(Value::to_string),
        }
    }
}
