//! Compiled predicates and bound parameters.

/// A value bound to a `?` placeholder.
///
/// Mirrors SQLite's storage classes so the backend can bind without guessing.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Integer(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Real(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlParam::Null)
    }
}

/// SQL boolean expression plus its parameters in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Predicate without parameters
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// `column IN (?, ?, ...)` over integer ids, constant false when empty
    pub fn id_in(column: &str, ids: &[i64]) -> Self {
        if ids.is_empty() {
            return Self::raw("0");
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        Self::new(
            format!("{} IN ({})", column, placeholders),
            ids.iter().copied().map(SqlParam::Integer).collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Conjoin predicates, skipping empty ones
    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut sql = Vec::new();
        let mut params = Vec::new();
        for part in parts {
            if part.is_empty() {
                continue;
            }
            sql.push(part.sql);
            params.extend(part.params);
        }
        Self {
            sql: sql.join(" AND "),
            params,
        }
    }
}
