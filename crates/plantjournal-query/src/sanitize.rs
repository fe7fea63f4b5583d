//! Conversion of JSON operands into bound parameters.
//!
//! Two encodings exist. Relational columns take the operand more or less as
//! it is ([`bind_plain`]). JSON-valued columns use [`sanitize_json`], which is
//! also the encoding used to store JSON payloads, so stored values and filter
//! operands always compare like for like.

use crate::predicate::SqlParam;
use serde::de::IgnoredAny;
use serde_json::{Number, Value};

/// Encode a value for comparison against (or storage in) a JSON column.
///
/// Plain strings, integers and floats pass through unchanged. Booleans,
/// null, arrays, objects and strings that are themselves valid JSON text are
/// serialized to canonical JSON text. This keeps `true`, `"true"`,
/// `{"a":1}` and `"{\"a\":1}"` distinguishable.
pub fn sanitize_json(value: &Value) -> SqlParam {
    match value {
        Value::String(s) if !is_json_text(s) => SqlParam::Text(s.clone()),
        Value::Number(n) => number_param(n),
        other => SqlParam::Text(other.to_string()),
    }
}

/// Encode a value for comparison against a relational column.
pub fn bind_plain(value: &Value) -> SqlParam {
    match value {
        Value::Null => SqlParam::Null,
        Value::Bool(b) => SqlParam::Integer(i64::from(*b)),
        Value::Number(n) => number_param(n),
        Value::String(s) => SqlParam::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlParam::Text(value.to_string()),
    }
}

/// Syntax-only validity check, matching SQLite's `json_valid`.
///
/// Deserializing into `IgnoredAny` skips number conversion, so numbers out of
/// `f64` range (`1e400`) still count as JSON text.
fn is_json_text(s: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(s).is_ok()
}

fn number_param(n: &Number) -> SqlParam {
    if let Some(i) = n.as_i64() {
        SqlParam::Integer(i)
    } else if let Some(f) = n.as_f64() {
        SqlParam::Real(f)
    } else {
        SqlParam::Text(n.to_string())
    }
}
