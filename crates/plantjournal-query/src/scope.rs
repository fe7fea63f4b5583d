//! Alias resolution seam between the compiler and a concrete schema.

use std::fmt;

/// Physical `table.column` reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: &'static str,
    pub column: &'static str,
}

impl ColumnRef {
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self { table, column }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// How the compiler must treat a resolved column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Ordinary relational column
    Plain,
    /// Column holding a sanitized JSON payload
    Json,
}

/// Result of resolving a filterable alias
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterTarget {
    pub column: ColumnRef,
    pub kind: TargetKind,
}

impl FilterTarget {
    pub const fn plain(table: &'static str, column: &'static str) -> Self {
        Self {
            column: ColumnRef::new(table, column),
            kind: TargetKind::Plain,
        }
    }

    pub const fn json(table: &'static str, column: &'static str) -> Self {
        Self {
            column: ColumnRef::new(table, column),
            kind: TargetKind::Json,
        }
    }
}

/// The set of aliases a query may filter on.
///
/// Implemented by the backend's per-entity scope. Returning `None` makes the
/// compiler reject the alias.
pub trait AliasScope {
    fn resolve(&self, alias: &str) -> Option<FilterTarget>;
}
