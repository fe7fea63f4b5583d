//! Criteria model and filter parsing.
//!
//! A filter object maps attribute aliases to either a literal (implicit
//! `$eq`) or an operator object such as `{ "$gte": 3, "$lt": 9 }`. Multiple
//! operators on one attribute, and multiple attributes, are conjoined.

use crate::error::{QueryError, QueryResult};
use crate::operator::Operator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Controls which rows a find, update or delete touches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    /// Filter object; absent means every row
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    /// Aliases to return; absent means every selectable alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria with the given filter object
    pub fn filter(filter: Value) -> Self {
        Self::new().with_filter(filter)
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// One `alias <op> operand` term of a filter
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Key as written by the caller, possibly dotted (`journalValue.amount`)
    pub key: String,
    pub operator: Operator,
    pub operand: Value,
}

/// Flatten a filter object into conditions, in key order.
pub fn parse_filter(filter: &Value) -> QueryResult<Vec<Condition>> {
    let object = filter
        .as_object()
        .ok_or_else(|| QueryError::InvalidFilter(format!("expected an object, got {}", filter)))?;

    let mut conditions = Vec::new();
    for (key, value) in object {
        if let Value::Object(map) = value {
            if is_operator_object(key, map)? {
                for (op_key, operand) in map {
                    let operator =
                        Operator::parse(op_key).ok_or_else(|| QueryError::UnknownOperator {
                            alias: key.clone(),
                            operator: op_key.clone(),
                        })?;
                    conditions.push(Condition {
                        key: key.clone(),
                        operator,
                        operand: operand.clone(),
                    });
                }
                continue;
            }
        }

        conditions.push(Condition {
            key: key.clone(),
            operator: Operator::Eq,
            operand: value.clone(),
        });
    }

    Ok(conditions)
}

/// An object is an operator object when all of its keys start with `$`.
/// Objects without any `$` key are literals compared as JSON.
fn is_operator_object(alias: &str, map: &Map<String, Value>) -> QueryResult<bool> {
    let dollar = map.keys().filter(|k| k.starts_with('$')).count();
    if dollar == 0 {
        return Ok(false);
    }
    if dollar != map.len() {
        return Err(QueryError::InvalidOperand {
            alias: alias.to_string(),
            operator: "$eq".to_string(),
            reason: "operator keys cannot be mixed with literal keys".to_string(),
        });
    }
    Ok(true)
}
