//! SELECT statement builder.

use crate::predicate::{Predicate, SqlParam};

/// Output of [`SelectQuery::build`]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    /// The generated SQL with positional `?` placeholders
    pub sql: String,
    /// Parameters in placeholder order
    pub params: Vec<SqlParam>,
}

/// Incrementally assembled SELECT.
///
/// Cloning is cheap enough to derive a count query from a row query after
/// filters are attached.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    from: String,
    joins: Vec<String>,
    fields: Vec<String>,
    filters: Vec<Predicate>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectQuery {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            from: table.into(),
            ..Self::default()
        }
    }

    /// Append a join clause verbatim (`LEFT JOIN x ON ...`)
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    pub fn field(mut self, expr: impl Into<String>) -> Self {
        self.fields.push(expr.into());
        self
    }

    pub fn fields<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(exprs.into_iter().map(Into::into));
        self
    }

    /// Add a predicate; multiple filters are conjoined
    pub fn filter(mut self, predicate: Predicate) -> Self {
        if !predicate.is_empty() {
            self.filters.push(predicate);
        }
        self
    }

    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by.push(expr.into());
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    /// Same source and filters, selecting only `expr` with no grouping,
    /// ordering or pagination
    pub fn count(&self, expr: &str) -> Self {
        Self {
            from: self.from.clone(),
            joins: self.joins.clone(),
            fields: vec![format!("COUNT({})", expr)],
            filters: self.filters.clone(),
            ..Self::default()
        }
    }

    pub fn build(&self) -> RenderedQuery {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", fields, self.from);
        let mut params = Vec::new();

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.filters.is_empty() {
            let predicate = Predicate::and(self.filters.iter().cloned());
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.sql);
            params.extend(predicate.params);
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        // SQLite only accepts OFFSET after LIMIT; -1 means unbounded
        if self.limit.is_some() || self.offset.is_some() {
            sql.push_str(" LIMIT ?");
            params.push(SqlParam::Integer(
                self.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX)),
            ));
            if let Some(offset) = self.offset {
                sql.push_str(" OFFSET ?");
                params.push(SqlParam::Integer(
                    i64::try_from(offset).unwrap_or(i64::MAX),
                ));
            }
        }

        RenderedQuery { sql, params }
    }
}
