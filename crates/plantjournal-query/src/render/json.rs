//! Translator for JSON-valued columns.
//!
//! Stored payloads are sanitized text (see [`crate::sanitize_json`]), so every
//! value pulled out of a document is re-encoded the same way before it is
//! compared: booleans and nested containers become JSON text, strings that
//! are themselves JSON text get quoted, numbers stay numbers. Columns that
//! hold a plain (non-JSON) string are treated as JSON `null` when a path or
//! key lookup is involved.

use super::{compare, invalid_operand, membership, null_check};
use crate::error::{QueryError, QueryResult};
use crate::operator::Operator;
use crate::predicate::{Predicate, SqlParam};
use crate::sanitize::sanitize_json;
use crate::scope::ColumnRef;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

static KEY_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[^".\[\]]+$"#).unwrap());
static INDEX_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(u64),
}

/// Location inside a JSON document, rendered as an SQLite JSON path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// The document root, `$`
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the dotted tail of a filter key (`a.b.0` from
    /// `journalValue.a.b.0`). All-digit segments address array elements.
    pub fn parse(alias: &str, dotted: &str) -> QueryResult<Self> {
        let mut path = Self::root();
        for segment in dotted.split('.') {
            path = path.child(alias, segment)?;
        }
        Ok(path)
    }

    /// Extend the path by one segment
    pub fn child(&self, alias: &str, segment: &str) -> QueryResult<Self> {
        let parsed = if INDEX_SEGMENT.is_match(segment) {
            let index = segment.parse().map_err(|_| QueryError::InvalidPath {
                alias: alias.to_string(),
                reason: format!("array index '{}' out of range", segment),
            })?;
            Segment::Index(index)
        } else if KEY_SEGMENT.is_match(segment) {
            Segment::Key(segment.to_string())
        } else {
            return Err(QueryError::InvalidPath {
                alias: alias.to_string(),
                reason: format!("invalid path segment '{}'", segment),
            });
        };

        let mut segments = self.segments.clone();
        segments.push(parsed);
        Ok(Self { segments })
    }

    /// Extend the path by one object key, taken verbatim.
    ///
    /// Unlike [`JsonPath::child`], digits stay a key and `.`, `[` or `]` are
    /// allowed since the key is rendered quoted. Only `"` cannot be quoted.
    pub fn key(&self, alias: &str, key: &str) -> QueryResult<Self> {
        if key.contains('"') {
            return Err(QueryError::InvalidPath {
                alias: alias.to_string(),
                reason: format!("key '{}' contains a double quote", key),
            });
        }

        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => write!(f, ".\"{}\"", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Column value, or `'null'` when the column does not hold JSON text
fn guarded(column: &str) -> String {
    format!("iif(json_valid({0}), {0}, 'null')", column)
}

/// Re-encode a `json_each`/`json_tree` row the way [`sanitize_json`] would
fn encoded(row: &str) -> String {
    format!(
        "CASE {0}.type WHEN 'true' THEN 'true' WHEN 'false' THEN 'false' WHEN 'null' THEN 'null' \
         WHEN 'text' THEN iif(json_valid({0}.atom), json_quote({0}.atom), {0}.atom) \
         ELSE {0}.value END",
        row
    )
}

/// Scalar subquery yielding the encoded value at `path`, or NULL when absent
fn extraction(column: &str, path: &JsonPath) -> Predicate {
    Predicate::new(
        format!(
            "(SELECT {} FROM json_tree({}, ?) AS node LIMIT 1)",
            encoded("node"),
            guarded(column)
        ),
        vec![SqlParam::Text(path.to_string())],
    )
}

/// Translate one condition against a JSON column, optionally at a path.
pub fn translate(
    alias: &str,
    column: ColumnRef,
    path: Option<&JsonPath>,
    operator: Operator,
    operand: &Value,
) -> QueryResult<Predicate> {
    let column = column.to_string();

    match operator {
        Operator::Has | Operator::NotHas => {
            let key = operand
                .as_str()
                .ok_or_else(|| invalid_operand(alias, operator, "expected a key string"))?;
            let base = path.cloned().unwrap_or_default();
            let key_path = base.key(alias, key)?;
            let check = if operator == Operator::Has {
                "IS NOT NULL"
            } else {
                "IS NULL"
            };
            Ok(Predicate::new(
                format!("json_type({}, ?) {}", guarded(&column), check),
                vec![SqlParam::Text(key_path.to_string())],
            ))
        }
        Operator::Contains | Operator::NotContains => {
            let base = path.cloned().unwrap_or_default();
            let negation = if operator == Operator::NotContains {
                "NOT "
            } else {
                ""
            };
            Ok(Predicate::new(
                format!(
                    "{}EXISTS (SELECT 1 FROM json_each({}, ?) AS element \
                     WHERE element.key IS NOT NULL AND {} = ?)",
                    negation,
                    guarded(&column),
                    encoded("element")
                ),
                vec![SqlParam::Text(base.to_string()), sanitize_json(operand)],
            ))
        }
        _ => {
            let lhs = match path {
                Some(path) if !path.is_root() => extraction(&column, path),
                _ => Predicate::raw(column),
            };
            match operator {
                Operator::Eq | Operator::Neq if operand.is_null() => Ok(null_check(&lhs, operator)),
                Operator::In | Operator::NotIn => {
                    membership(&lhs, alias, operator, operand, sanitize_json)
                }
                _ => {
                    let comparator = operator
                        .comparator()
                        .ok_or_else(|| invalid_operand(alias, operator, "not a comparison"))?;
                    Ok(compare(&lhs, comparator, sanitize_json(operand)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    const VALUE: ColumnRef = ColumnRef::new("journals", "journalValue");

    #[test_case("amount", "$.\"amount\"" ; "single key")]
    #[test_case("a.b", "$.\"a\".\"b\"" ; "nested keys")]
    #[test_case("list.0", "$.\"list\"[0]" ; "array index")]
    #[test_case("12", "$[12]" ; "top level index")]
    #[test_case("with space", "$.\"with space\"" ; "key with space")]
    fn test_path_parse(dotted: &str, expected: &str) {
        assert_eq!(
            JsonPath::parse("journalValue", dotted).unwrap().to_string(),
            expected
        );
    }

    #[test_case("a..b" ; "empty segment")]
    #[test_case("a.b\"c" ; "quote")]
    #[test_case("a[0]" ; "bracket")]
    fn test_path_rejects(dotted: &str) {
        let err = JsonPath::parse("journalValue", dotted).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPath { .. }));
    }

    #[test]
    fn test_root_path_display() {
        assert_eq!(JsonPath::root().to_string(), "$");
        assert!(JsonPath::root().is_root());
    }

    #[test]
    fn test_whole_column_comparison_is_sanitized() {
        let p = translate("journalValue", VALUE, None, Operator::Eq, &json!(true)).unwrap();
        assert_eq!(p.sql, "journals.journalValue = ?");
        assert_eq!(p.params, vec![SqlParam::Text("true".into())]);

        let p = translate("journalValue", VALUE, None, Operator::Eq, &json!({"a": 1})).unwrap();
        assert_eq!(p.params, vec![SqlParam::Text(r#"{"a":1}"#.into())]);
    }

    #[test]
    fn test_path_comparison_uses_extraction() {
        let path = JsonPath::parse("journalValue", "amount").unwrap();
        let p = translate("journalValue", VALUE, Some(&path), Operator::Gt, &json!(3)).unwrap();

        assert!(p.sql.starts_with("(SELECT CASE node.type"));
        assert!(p.sql.contains("FROM json_tree(iif(json_valid(journals.journalValue)"));
        assert!(p.sql.ends_with(") > ?"));
        assert_eq!(
            p.params,
            vec![
                SqlParam::Text("$.\"amount\"".into()),
                SqlParam::Integer(3)
            ]
        );
    }

    #[test]
    fn test_path_null_check() {
        let path = JsonPath::parse("journalValue", "note").unwrap();
        let p = translate("journalValue", VALUE, Some(&path), Operator::Eq, &Value::Null).unwrap();
        assert!(p.sql.ends_with(") IS NULL"));
        assert_eq!(p.params, vec![SqlParam::Text("$.\"note\"".into())]);
    }

    #[test]
    fn test_path_membership() {
        let path = JsonPath::parse("journalValue", "unit").unwrap();
        let p = translate(
            "journalValue",
            VALUE,
            Some(&path),
            Operator::In,
            &json!(["ml", true]),
        )
        .unwrap();

        assert!(p.sql.ends_with(") IN (?, ?)"));
        assert_eq!(
            p.params,
            vec![
                SqlParam::Text("$.\"unit\"".into()),
                SqlParam::Text("ml".into()),
                SqlParam::Text("true".into()),
            ]
        );
    }

    #[test]
    fn test_has_key() {
        let p = translate("journalValue", VALUE, None, Operator::Has, &json!("amount")).unwrap();
        assert_eq!(
            p.sql,
            "json_type(iif(json_valid(journals.journalValue), journals.journalValue, 'null'), ?) IS NOT NULL"
        );
        assert_eq!(p.params, vec![SqlParam::Text("$.\"amount\"".into())]);

        let path = JsonPath::parse("journalValue", "nested").unwrap();
        let p = translate("journalValue", VALUE, Some(&path), Operator::NotHas, &json!("k")).unwrap();
        assert!(p.sql.ends_with("IS NULL"));
        assert_eq!(p.params, vec![SqlParam::Text("$.\"nested\".\"k\"".into())]);
    }

    #[test_case("1", "$.\"1\"" ; "digits stay a key")]
    #[test_case("a.b", "$.\"a.b\"" ; "dot stays inside the key")]
    #[test_case("x[0]", "$.\"x[0]\"" ; "brackets stay inside the key")]
    fn test_has_key_is_verbatim(key: &str, expected: &str) {
        let p = translate("journalValue", VALUE, None, Operator::Has, &json!(key)).unwrap();
        assert_eq!(p.params, vec![SqlParam::Text(expected.into())]);
    }

    #[test]
    fn test_has_rejects_quoted_key() {
        let err =
            translate("journalValue", VALUE, None, Operator::Has, &json!("a\"b")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPath { .. }));
    }

    #[test]
    fn test_has_requires_string() {
        let err = translate("journalValue", VALUE, None, Operator::Has, &json!(1)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidOperand { .. }));
    }

    #[test]
    fn test_contains() {
        let p = translate("journalValue", VALUE, None, Operator::Contains, &json!("foo")).unwrap();
        assert!(p.sql.starts_with("EXISTS (SELECT 1 FROM json_each("));
        assert!(p.sql.contains("element.key IS NOT NULL"));
        assert_eq!(
            p.params,
            vec![SqlParam::Text("$".into()), SqlParam::Text("foo".into())]
        );

        let path = JsonPath::parse("journalValue", "tags").unwrap();
        let p = translate(
            "journalValue",
            VALUE,
            Some(&path),
            Operator::NotContains,
            &json!(false),
        )
        .unwrap();
        assert!(p.sql.starts_with("NOT EXISTS"));
        assert_eq!(
            p.params,
            vec![
                SqlParam::Text("$.\"tags\"".into()),
                SqlParam::Text("false".into())
            ]
        );
    }
}
