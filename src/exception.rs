use serde::Serialize;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Write};

/// Stack text used when no trace was captured for an error.
pub const UNKNOWN_STACK_TRACE: &str = "UNKNOWN";

/// Maximum number of links followed along a cause chain.
pub const DEFAULT_MAX_EXCEPTION_DEPTH: usize = 100;

/// Plain, serializable view of one error in a cause chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionNode {
    pub type_name: String,
    pub message: String,
    pub stack_trace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<ExceptionNode>>,
}

impl ExceptionNode {
    /// Iterate the chain from this node inwards.
    pub fn chain(&self) -> impl Iterator<Item = &ExceptionNode> {
        std::iter::successors(Some(self), |node| node.inner.as_deref())
    }

    /// Number of nodes in the chain, this one included.
    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    /// Legacy flattened rendering:
    /// `<Exception>outer</Exception><InnerException>inner</InnerException>...`
    pub fn to_legacy_text(&self) -> String {
        let mut out = String::new();
        for (index, node) in self.chain().enumerate() {
            append_exception_message(&mut out, &node.message, index);
        }
        out
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Append one legacy tag. The outermost error (index 0) is tagged
/// `Exception`, every following link `InnerException`.
pub fn append_exception_message(out: &mut String, message: &str, index: usize) {
    let tag = if index == 0 { "Exception" } else { "InnerException" };
    let _ = write!(out, "<{tag}>{message}</{tag}>");
}

/// Normalize an error and its `source()` chain into an [`ExceptionNode`]
/// tree, following at most [`DEFAULT_MAX_EXCEPTION_DEPTH`] links.
pub fn normalize(exception: Option<&(dyn Error + 'static)>) -> Option<ExceptionNode> {
    normalize_with_depth(exception, DEFAULT_MAX_EXCEPTION_DEPTH)
}

/// Like [`normalize`] with an explicit depth cap (at least one link is
/// always kept). Chains longer than the cap, including cyclic ones, are
/// truncated.
pub fn normalize_with_depth(
    exception: Option<&(dyn Error + 'static)>,
    max_depth: usize,
) -> Option<ExceptionNode> {
    normalize_named(exception, None, max_depth)
}

/// Normalize an error whose concrete type is known, naming the outermost
/// node after `E`.
pub fn normalize_typed<E: Error + 'static>(exception: &E, max_depth: usize) -> Option<ExceptionNode> {
    normalize_named(Some(exception), Some(std::any::type_name::<E>()), max_depth)
}

/// Like [`normalize_with_depth`], with `outer_type` as the type name of
/// the outermost node. A [`Fault`] keeps its own name regardless.
pub fn normalize_named(
    exception: Option<&(dyn Error + 'static)>,
    outer_type: Option<&str>,
    max_depth: usize,
) -> Option<ExceptionNode> {
    let max_depth = max_depth.max(1);
    let mut links = Vec::new();
    let mut current = exception;

    while let Some(err) = current {
        if links.len() == max_depth {
            tracing::warn!(max_depth, "exception chain truncated at depth cap");
            break;
        }
        let mut node = describe(err);
        if links.is_empty() && !err.is::<Fault>() {
            if let Some(name) = outer_type {
                node.type_name = name.to_string();
            }
        }
        links.push(node);
        current = err.source();
    }

    links.into_iter().rev().fold(None, |inner, mut node| {
        node.inner = inner.map(Box::new);
        Some(node)
    })
}

/// Legacy flattened text for an error chain; empty for `None`.
pub fn flatten_messages(exception: Option<&(dyn Error + 'static)>) -> String {
    normalize(exception)
        .map(|node| node.to_legacy_text())
        .unwrap_or_default()
}

fn describe(err: &(dyn Error + 'static)) -> ExceptionNode {
    if let Some(fault) = err.downcast_ref::<Fault>() {
        return ExceptionNode {
            type_name: fault.type_name.clone(),
            message: fault.message.clone(),
            stack_trace: fault
                .stack_trace
                .clone()
                .unwrap_or_else(|| UNKNOWN_STACK_TRACE.to_string()),
            data: (!fault.data.is_empty()).then(|| fault.data.clone()),
            inner: None,
        };
    }

    ExceptionNode {
        type_name: guess_type_name(err),
        message: err.to_string(),
        stack_trace: UNKNOWN_STACK_TRACE.to_string(),
        data: None,
        inner: None,
    }
}

/// Best-effort type name for an error whose concrete type is erased,
/// i.e. every `source()` link and an outermost error handed over as
/// `&dyn Error`.
///
/// Well-known std errors are recognised by downcasting. Anything else is
/// named after the leading identifier of its `Debug` output: the struct
/// name for derived structs, but only the variant name for enums. Pass
/// the concrete error (see [`normalize_typed`]) to get its real type name.
fn guess_type_name(err: &(dyn Error + 'static)) -> String {
    if err.is::<std::io::Error>() {
        return "std::io::Error".to_string();
    }
    if err.is::<std::num::ParseIntError>() {
        return "std::num::ParseIntError".to_string();
    }
    if err.is::<std::num::ParseFloatError>() {
        return "std::num::ParseFloatError".to_string();
    }
    if err.is::<std::str::Utf8Error>() {
        return "std::str::Utf8Error".to_string();
    }
    if err.is::<fmt::Error>() {
        return "std::fmt::Error".to_string();
    }
    if err.is::<serde_json::Error>() {
        return "serde_json::Error".to_string();
    }

    let debug = format!("{err:?}");
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    let name = name.trim_end_matches(':');
    if name.is_empty() {
        "Error".to_string()
    } else {
        name.to_string()
    }
}

/// Error value carrying everything an [`ExceptionNode`] can hold: an
/// explicit type name, captured stack text, diagnostic data and an
/// optional inner cause.
pub struct Fault {
    type_name: String,
    message: String,
    stack_trace: Option<String>,
    data: BTreeMap<String, String>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl Fault {
    /// New fault with a backtrace captured at this point, when backtraces
    /// are enabled (`RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`).
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let backtrace = Backtrace::capture();
        let stack_trace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Fault {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace,
            data: BTreeMap::new(),
            source: None,
        }
    }

    /// Convert an arbitrary error chain into faults. The outermost link
    /// is named after `E`; erased inner links get a best-effort name.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let mut links: Vec<&(dyn Error + 'static)> = Vec::new();
        let mut current = err.source();
        while let Some(link) = current {
            if links.len() + 1 == DEFAULT_MAX_EXCEPTION_DEPTH {
                break;
            }
            links.push(link);
            current = link.source();
        }

        let inner = links.into_iter().rev().fold(None, |inner: Option<Fault>, link| {
            let mut fault = match link.downcast_ref::<Fault>() {
                Some(existing) => existing.shallow_clone(),
                None => Fault::new(guess_type_name(link), link.to_string()).without_stack_trace(),
            };
            fault.source = inner.map(|f| Box::new(f) as Box<dyn Error + Send + Sync>);
            Some(fault)
        });

        let outer: &(dyn Error + 'static) = err;
        let mut fault = match outer.downcast_ref::<Fault>() {
            Some(existing) => existing.shallow_clone(),
            None => Fault::new(std::any::type_name::<E>(), err.to_string()),
        };
        fault.source = inner.map(|f| Box::new(f) as Box<dyn Error + Send + Sync>);
        fault
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }

    pub fn with_inner(mut self, inner: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        self.source = Some(inner.into());
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn without_stack_trace(mut self) -> Self {
        self.stack_trace = None;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    fn shallow_clone(&self) -> Self {
        Fault {
            type_name: self.type_name.clone(),
            message: self.message.clone(),
            stack_trace: self.stack_trace.clone(),
            data: self.data.clone(),
            source: None,
        }
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("type_name", &self.type_name)
            .field("message", &self.message)
            .field("data", &self.data)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|inner| inner as &(dyn Error + 'static))
    }
}
