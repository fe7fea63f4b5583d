//! Filter operators.

use std::fmt;

/// Closed set of operators accepted inside an operator object.
///
/// Plain values in a filter default to [`Operator::Eq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
    /// Key present inside a JSON value
    Has,
    /// Key absent inside a JSON value
    NotHas,
    /// Some element of a JSON array/object equals the operand
    Contains,
    /// No element of a JSON array/object equals the operand
    NotContains,
}

impl Operator {
    /// Every operator, in declaration order
    pub const ALL: [Operator; 14] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
        Operator::Has,
        Operator::NotHas,
        Operator::Contains,
        Operator::NotContains,
    ];

    /// Parse the `$op` key used in filter objects
    pub fn parse(key: &str) -> Option<Self> {
        let op = match key {
            "$eq" => Operator::Eq,
            "$neq" => Operator::Neq,
            "$gt" => Operator::Gt,
            "$gte" => Operator::Gte,
            "$lt" => Operator::Lt,
            "$lte" => Operator::Lte,
            "$like" => Operator::Like,
            "$nlike" => Operator::NotLike,
            "$in" => Operator::In,
            "$nin" => Operator::NotIn,
            "$has" => Operator::Has,
            "$nhas" => Operator::NotHas,
            "$contains" => Operator::Contains,
            "$ncontains" => Operator::NotContains,
            _ => return None,
        };
        Some(op)
    }

    /// The `$op` spelling of this operator
    pub fn key(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Neq => "$neq",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Like => "$like",
            Operator::NotLike => "$nlike",
            Operator::In => "$in",
            Operator::NotIn => "$nin",
            Operator::Has => "$has",
            Operator::NotHas => "$nhas",
            Operator::Contains => "$contains",
            Operator::NotContains => "$ncontains",
        }
    }

    /// SQL comparator for the direct comparison family, `None` otherwise
    pub fn comparator(&self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::Neq => Some("!="),
            Operator::Gt => Some(">"),
            Operator::Gte => Some(">="),
            Operator::Lt => Some("<"),
            Operator::Lte => Some("<="),
            Operator::Like => Some("LIKE"),
            Operator::NotLike => Some("NOT LIKE"),
            Operator::In
            | Operator::NotIn
            | Operator::Has
            | Operator::NotHas
            | Operator::Contains
            | Operator::NotContains => None,
        }
    }

    /// Operators that only make sense on JSON-valued attributes
    pub fn is_json_only(&self) -> bool {
        matches!(
            self,
            Operator::Has | Operator::NotHas | Operator::Contains | Operator::NotContains
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
