//! Value normalization
//!
//! Converts the loosely typed field values collectors gather from API
//! responses into the canonical string form used for tabular display.
//! Every rule is total: a value that cannot be represented degrades to the
//! empty string instead of failing resource construction.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// A field value as gathered from an API response, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent or explicitly null
    Missing,
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A point in time, rendered as RFC3339 UTC with second precision
    Time(DateTime<Utc>),
    /// A list of strings, rendered sorted and newline-joined
    StrList(Vec<String>),
    /// A structured payload with no direct string form
    Json(Value),
}

impl FieldValue {
    /// Map a raw JSON value into the closest typed field value.
    pub fn from_json(value: &Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Missing,
            Value::String(s) => FieldValue::Str(s.clone()),
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::Array(items) => {
                if items.iter().all(|v| v.is_string()) {
                    FieldValue::StrList(
                        items
                            .iter()
                            .filter_map(|v| v.as_str())
                            .map(str::to_string)
                            .collect(),
                    )
                } else {
                    FieldValue::Json(value.clone())
                }
            }
            Value::Object(_) => FieldValue::Json(value.clone()),
        }
    }

    /// Wrap an optional string, mapping `None` to `Missing`.
    pub fn opt_str(value: Option<&str>) -> FieldValue {
        match value {
            Some(s) => FieldValue::Str(s.to_string()),
            None => FieldValue::Missing,
        }
    }
}

/// Normalize a single field value into its canonical display string.
pub fn normalize_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Missing => String::new(),
        FieldValue::Str(s) => s.clone(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => {
            if f.is_finite() {
                format!("{}", f)
            } else {
                String::new()
            }
        }
        FieldValue::Time(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        FieldValue::StrList(items) => {
            // Display order is sorted, not insertion order
            let mut sorted = items.clone();
            sorted.sort();
            sorted.join("\n")
        }
        FieldValue::Json(Value::Null) => String::new(),
        FieldValue::Json(v) => {
            serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
        }
    }
}

/// Normalize a field-name -> value record, preserving field order.
///
/// Idempotent: string values pass through unchanged, so running a record
/// through twice yields the same result.
pub fn normalize_record(fields: Vec<(String, FieldValue)>) -> Vec<(String, String)> {
    fields
        .into_iter()
        .map(|(name, value)| {
            let normalized = normalize_value(&value);
            (name, normalized)
        })
        .collect()
}
