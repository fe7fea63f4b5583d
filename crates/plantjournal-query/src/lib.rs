//! Criteria-to-SQL compiler for the plant journal store
//!
//! Translates the declarative filter language used by every find, update and
//! delete call into parameterized SQLite predicates.
//!
//! ## Pipeline
//!
//! ```text
//! Criteria { where, fields, limit, offset }
//!     -> criteria::parse_filter   (attribute -> operator/operand conditions)
//!     -> render::compile_where    (alias resolution through an AliasScope)
//!          -> render::column      (relational columns)
//!          -> render::json        (JSON-valued columns and dotted paths)
//!     -> Predicate { sql, params }
//!     -> SelectQuery::build       (RenderedQuery ready for execution)
//! ```
//!
//! The compiler never interpolates caller values into SQL text. Every literal
//! becomes a [`SqlParam`] bound positionally by the backend.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plantjournal_query::{compile_where, SelectQuery};
//! use serde_json::json;
//!
//! let filter = json!({ "familyName": { "$like": "Sour%" } });
//! let predicate = compile_where(Some(&filter), &scope)?;
//! let query = SelectQuery::from("families").field("families.familyId").filter(predicate);
//! let rendered = query.build();
//! ```

pub mod criteria;
pub mod error;
pub mod operator;
pub mod predicate;
pub mod render;
pub mod sanitize;
pub mod scope;
pub mod select;

// Re-exports
pub use criteria::{parse_filter, Condition, Criteria};
pub use error::{QueryError, QueryResult};
pub use operator::Operator;
pub use predicate::{Predicate, SqlParam};
pub use render::json::JsonPath;
pub use render::compile_where;
pub use sanitize::{bind_plain, sanitize_json};
pub use scope::{AliasScope, ColumnRef, FilterTarget, TargetKind};
pub use select::{RenderedQuery, SelectQuery};
