//! Where-clause compiler.
//!
//! Resolves every condition of a filter through an [`AliasScope`] and hands
//! it to the relational ([`column`]) or JSON ([`json`]) translator. The
//! resulting predicates are conjoined; there is no disjunction.

pub mod column;
pub mod json;

use crate::criteria::{parse_filter, Condition};
use crate::error::{QueryError, QueryResult};
use crate::operator::Operator;
use crate::predicate::{Predicate, SqlParam};
use crate::scope::{AliasScope, TargetKind};
use json::JsonPath;
use serde_json::Value;

/// Compile an optional filter object into a predicate.
///
/// `None` and `null` compile to an empty predicate (no restriction).
pub fn compile_where(filter: Option<&Value>, scope: &dyn AliasScope) -> QueryResult<Predicate> {
    let filter = match filter {
        Some(f) if !f.is_null() => f,
        _ => return Ok(Predicate::default()),
    };

    let conditions = parse_filter(filter)?;
    let mut parts = Vec::with_capacity(conditions.len());
    for condition in &conditions {
        parts.push(compile_condition(condition, scope)?);
    }

    Ok(Predicate::and(parts))
}

fn compile_condition(condition: &Condition, scope: &dyn AliasScope) -> QueryResult<Predicate> {
    let Condition {
        key,
        operator,
        operand,
    } = condition;

    if let Some(target) = scope.resolve(key) {
        return match target.kind {
            TargetKind::Plain => column::translate(key, target.column, *operator, operand),
            TargetKind::Json => json::translate(key, target.column, None, *operator, operand),
        };
    }

    // Dotted keys address a location inside a JSON attribute
    if let Some((root, rest)) = key.split_once('.') {
        if let Some(target) = scope.resolve(root) {
            if target.kind != TargetKind::Json {
                return Err(QueryError::InvalidPath {
                    alias: root.to_string(),
                    reason: "attribute is not JSON-valued".to_string(),
                });
            }
            let path = JsonPath::parse(root, rest)?;
            return json::translate(root, target.column, Some(&path), *operator, operand);
        }
    }

    Err(QueryError::UnknownAlias { alias: key.clone() })
}

/// `lhs <cmp> ?`
pub(crate) fn compare(lhs: &Predicate, comparator: &str, param: SqlParam) -> Predicate {
    let mut params = lhs.params.clone();
    params.push(param);
    Predicate::new(format!("{} {} ?", lhs.sql, comparator), params)
}

/// `lhs IS [NOT] NULL`, used for `$eq: null` and `$neq: null`
pub(crate) fn null_check(lhs: &Predicate, operator: Operator) -> Predicate {
    let check = if operator == Operator::Neq {
        "IS NOT NULL"
    } else {
        "IS NULL"
    };
    Predicate::new(format!("{} {}", lhs.sql, check), lhs.params.clone())
}

/// `lhs [NOT] IN (?, ...)` with every element encoded on its own
pub(crate) fn membership(
    lhs: &Predicate,
    alias: &str,
    operator: Operator,
    operand: &Value,
    encode: fn(&Value) -> SqlParam,
) -> QueryResult<Predicate> {
    let items = operand
        .as_array()
        .ok_or_else(|| invalid_operand(alias, operator, "expected an array"))?;
    let negated = operator == Operator::NotIn;

    if items.is_empty() {
        return Ok(Predicate::raw(if negated { "1" } else { "0" }));
    }

    let placeholders = vec!["?"; items.len()].join(", ");
    let mut params = lhs.params.clone();
    params.extend(items.iter().map(encode));

    Ok(Predicate::new(
        format!(
            "{} {} ({})",
            lhs.sql,
            if negated { "NOT IN" } else { "IN" },
            placeholders
        ),
        params,
    ))
}

pub(crate) fn invalid_operand(alias: &str, operator: Operator, reason: &str) -> QueryError {
    QueryError::InvalidOperand {
        alias: alias.to_string(),
        operator: operator.key().to_string(),
        reason: reason.to_string(),
    }
}
