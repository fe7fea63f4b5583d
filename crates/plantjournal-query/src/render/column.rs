//! Translator for relational columns.

use super::{compare, invalid_operand, membership, null_check};
use crate::error::QueryResult;
use crate::operator::Operator;
use crate::predicate::Predicate;
use crate::sanitize::bind_plain;
use crate::scope::ColumnRef;
use serde_json::Value;

/// Translate one condition against a plain `table.column`.
pub fn translate(
    alias: &str,
    column: ColumnRef,
    operator: Operator,
    operand: &Value,
) -> QueryResult<Predicate> {
    let lhs = Predicate::raw(column.to_string());

    match operator {
        Operator::Eq | Operator::Neq if operand.is_null() => Ok(null_check(&lhs, operator)),
        Operator::In | Operator::NotIn => membership(&lhs, alias, operator, operand, bind_plain),
        Operator::Has | Operator::NotHas | Operator::Contains | Operator::NotContains => Err(
            invalid_operand(alias, operator, "only valid on JSON-valued attributes"),
        ),
        Operator::Eq
        | Operator::Neq
        | Operator::Gt
        | Operator::Gte
        | Operator::Lt
        | Operator::Lte
        | Operator::Like
        | Operator::NotLike => {
            let comparator = operator
                .comparator()
                .ok_or_else(|| invalid_operand(alias, operator, "not a comparison"))?;
            Ok(compare(&lhs, comparator, bind_plain(operand)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::predicate::SqlParam;
    use serde_json::json;
    use test_case::test_case;

    const NAME: ColumnRef = ColumnRef::new("families", "familyName");

    #[test_case(Operator::Eq, "families.familyName = ?" ; "eq")]
    #[test_case(Operator::Neq, "families.familyName != ?" ; "neq")]
    #[test_case(Operator::Gt, "families.familyName > ?" ; "gt")]
    #[test_case(Operator::Gte, "families.familyName >= ?" ; "gte")]
    #[test_case(Operator::Lt, "families.familyName < ?" ; "lt")]
    #[test_case(Operator::Lte, "families.familyName <= ?" ; "lte")]
    #[test_case(Operator::Like, "families.familyName LIKE ?" ; "like")]
    #[test_case(Operator::NotLike, "families.familyName NOT LIKE ?" ; "nlike")]
    fn test_comparisons(operator: Operator, expected: &str) {
        let p = translate("familyName", NAME, operator, &json!("Haze%")).unwrap();
        assert_eq!(p.sql, expected);
        assert_eq!(p.params, vec![SqlParam::Text("Haze%".into())]);
    }

    #[test]
    fn test_null_equality() {
        let p = translate("familyName", NAME, Operator::Eq, &Value::Null).unwrap();
        assert_eq!(p.sql, "families.familyName IS NULL");
        assert!(p.params.is_empty());

        let p = translate("familyName", NAME, Operator::Neq, &Value::Null).unwrap();
        assert_eq!(p.sql, "families.familyName IS NOT NULL");
    }

    #[test]
    fn test_in_binds_each_element() {
        let p = translate("familyName", NAME, Operator::In, &json!(["a", "b", 3])).unwrap();
        assert_eq!(p.sql, "families.familyName IN (?, ?, ?)");
        assert_eq!(
            p.params,
            vec![
                SqlParam::Text("a".into()),
                SqlParam::Text("b".into()),
                SqlParam::Integer(3)
            ]
        );

        let p = translate("familyName", NAME, Operator::NotIn, &json!(["a"])).unwrap();
        assert_eq!(p.sql, "families.familyName NOT IN (?)");
    }

    #[test]
    fn test_empty_membership_is_constant() {
        assert_eq!(
            translate("familyName", NAME, Operator::In, &json!([])).unwrap().sql,
            "0"
        );
        assert_eq!(
            translate("familyName", NAME, Operator::NotIn, &json!([])).unwrap().sql,
            "1"
        );
    }

    #[test]
    fn test_in_requires_array() {
        let err = translate("familyName", NAME, Operator::In, &json!("a")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidOperand { .. }));
    }

    #[test_case(Operator::Has ; "has")]
    #[test_case(Operator::NotHas ; "nhas")]
    #[test_case(Operator::Contains ; "contains")]
    #[test_case(Operator::NotContains ; "ncontains")]
    fn test_json_operators_rejected(operator: Operator) {
        let err = translate("familyName", NAME, operator, &json!("x")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidOperand { .. }));
    }
}
