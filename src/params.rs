use crate::locale::Locale;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Text written in place of a parameter whose value is null.
pub const NULL_VALUE: &str = "NULL";

/// Key/value parameters attached to a log call.
///
/// Keys are compared by string equality. Entries are kept sorted by key,
/// which gives every bag a stable rendering order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterBag {
    entries: BTreeMap<String, Value>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter. `None` and `Value::Null` both
    /// render as the null sentinel.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterBag
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = ParameterBag::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

/// Render a parameter bag in the tagged wire format:
/// `<parameter><key>k</key><value>v</value></parameter>` per entry, with
/// no separator between entries.
///
/// Returns the empty string for an absent or empty bag.
pub fn format_parameters(bag: Option<&ParameterBag>, locale: &Locale) -> String {
    let Some(bag) = bag.filter(|b| !b.is_empty()) else {
        return String::new();
    };

    let mut out = String::new();
    for (key, value) in bag.iter() {
        append_parameter(&mut out, key, value, locale);
    }
    out
}

/// Append a single `<parameter>` fragment.
pub fn append_parameter(out: &mut String, key: &str, value: &Value, locale: &Locale) {
    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "<parameter><key>{}</key><value>{}</value></parameter>",
        key,
        value_text(value, locale)
    );
}

/// Text form of a single parameter value.
pub fn value_text(value: &Value, locale: &Locale) -> String {
    match value {
        Value::Null => NULL_VALUE.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_f64() {
                n.as_f64()
                    .map(|f| locale.format_float(f))
                    .unwrap_or_else(|| n.to_string())
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}
