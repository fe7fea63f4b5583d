//! Generic create/find/update/delete templates
//!
//! Each template is a free function driven by an entity's descriptor and
//! alias scope. They run synchronously against one connection; the async
//! facade in [`crate::store`] moves them onto the blocking pool.

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod find;
pub(crate) mod row;
pub(crate) mod update;

pub use row::Row;

use crate::error::{is_foreign_key_violation, StoreError, StoreResult};
use crate::registry::{AttrType, Attribute, Entity, EntityScope, Presence};
use plantjournal_query::{bind_plain, compile_where, sanitize_json, SqlParam};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Rows keyed by id, per entity plural
pub type EntityMaps = BTreeMap<&'static str, BTreeMap<i64, Row>>;

/// Result of a find
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindResult {
    /// Matching rows ignoring pagination
    pub count: u64,
    /// Matching rows after the returned page
    pub remaining: u64,
    #[serde(flatten)]
    pub entities: EntityMaps,
}

impl FindResult {
    pub fn rows(&self, entity: Entity) -> Option<&BTreeMap<i64, Row>> {
        self.entities.get(entity.plural())
    }

    pub fn get(&self, entity: Entity, id: i64) -> Option<&Row> {
        self.rows(entity).and_then(|rows| rows.get(&id))
    }

    /// Ids of one entity in ascending order
    pub fn ids(&self, entity: Entity) -> Vec<i64> {
        self.rows(entity)
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// Rows written by a create, including auto-created ancestors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CreateResult {
    pub entities: EntityMaps,
}

impl CreateResult {
    pub fn rows(&self, entity: Entity) -> Option<&BTreeMap<i64, Row>> {
        self.entities.get(entity.plural())
    }

    pub fn ids(&self, entity: Entity) -> Vec<i64> {
        self.rows(entity)
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Id of the first (usually only) created row of an entity
    pub fn id(&self, entity: Entity) -> Option<i64> {
        self.rows(entity)
            .and_then(|rows| rows.keys().next().copied())
    }

    pub fn get(&self, entity: Entity, id: i64) -> Option<&Row> {
        self.rows(entity).and_then(|rows| rows.get(&id))
    }
}

/// Ids touched by an update or delete, per entity plural
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AffectedIds(BTreeMap<&'static str, Vec<i64>>);

impl AffectedIds {
    pub(crate) fn new(entity: Entity, ids: Vec<i64>) -> Self {
        let mut affected = Self::default();
        affected.0.insert(entity.plural(), ids);
        affected
    }

    pub(crate) fn insert(&mut self, entity: Entity, ids: Vec<i64>) {
        self.0.insert(entity.plural(), ids);
    }

    /// Ids of one entity, empty when none were touched
    pub fn get(&self, entity: Entity) -> &[i64] {
        self.0
            .get(entity.plural())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains_key(entity.plural())
    }

    pub fn entities(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

/// Check one attribute value; `source` is `options` or `patch`
pub(crate) fn check_value(attr: &Attribute, value: &Value, source: &str) -> StoreResult<()> {
    if value.is_null() {
        return match attr.presence {
            Presence::Nullable => Ok(()),
            _ => Err(StoreError::validation(format!(
                "{}.{} can not be null",
                source, attr.alias
            ))),
        };
    }

    let ok = match attr.ty {
        AttrType::Text => value.is_string(),
        AttrType::Integer | AttrType::Reference(_) => value.is_i64(),
        AttrType::Json => true,
        AttrType::Choice(choices) => value.as_str().is_some_and(|s| choices.contains(&s)),
    };
    if ok {
        return Ok(());
    }

    let expected = match attr.ty {
        AttrType::Text => "a string".to_string(),
        AttrType::Integer | AttrType::Reference(_) => "an integer".to_string(),
        AttrType::Json => "JSON".to_string(),
        AttrType::Choice(choices) => format!("one of {} or null", choices.join(", ")),
    };
    Err(StoreError::validation(format!(
        "{}.{} has to be {}",
        source, attr.alias, expected
    )))
}

/// Check a link attribute value: an array of integer ids, deduplicated
pub(crate) fn check_id_list(alias: &str, value: &Value, source: &str) -> StoreResult<Vec<i64>> {
    let invalid = || {
        StoreError::validation(format!(
            "{}.{} has to be an array of integers",
            source, alias
        ))
    };
    let items = value.as_array().ok_or_else(invalid)?;
    let mut ids = items
        .iter()
        .map(|v| v.as_i64().ok_or_else(invalid))
        .collect::<StoreResult<Vec<i64>>>()?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Parameter for an attribute column
pub(crate) fn bind_attribute(attr: &Attribute, value: &Value) -> SqlParam {
    match attr.ty {
        AttrType::Json => sanitize_json(value),
        _ => bind_plain(value),
    }
}

/// A submitted foreign key to verify after a constraint failure
pub(crate) struct ReferenceCheck {
    pub reference: String,
    pub target: Entity,
    pub id: i64,
}

impl ReferenceCheck {
    pub fn new(source: &str, alias: &str, target: Entity, id: i64) -> Self {
        Self {
            reference: format!("{}.{}", source, alias),
            target,
            id,
        }
    }
}

/// References attributes of an entity carried by `values`
pub(crate) fn reference_checks(
    attributes: &[Attribute],
    values: &serde_json::Map<String, Value>,
    source: &str,
) -> Vec<ReferenceCheck> {
    attributes
        .iter()
        .filter_map(|attr| match (attr.ty, values.get(attr.alias).and_then(Value::as_i64)) {
            (AttrType::Reference(target), Some(id)) => {
                Some(ReferenceCheck::new(source, attr.alias, target, id))
            }
            _ => None,
        })
        .collect()
}

/// Turn a failed write into a reference error naming the dangling key, or
/// pass it through unchanged
pub(crate) fn translate_write_error(
    conn: &Connection,
    err: rusqlite::Error,
    checks: &[ReferenceCheck],
) -> StoreError {
    if !is_foreign_key_violation(&err) {
        return err.into();
    }
    for check in checks {
        match exists(conn, check.target, check.id) {
            Ok(true) => {}
            Ok(false) => {
                return StoreError::Reference {
                    reference: check.reference.clone(),
                    target: check.target.name(),
                }
            }
            Err(e) => return e,
        }
    }
    err.into()
}

fn exists(conn: &Connection, entity: Entity, id: i64) -> StoreResult<bool> {
    let d = entity.descriptor();
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE {} = ?", d.table, d.id),
            [id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Ids of every target row matching a filter, ascending, without pagination
pub(crate) fn resolve_ids(
    conn: &Connection,
    scope: &EntityScope,
    filter: Option<&Value>,
) -> StoreResult<Vec<i64>> {
    let predicate = compile_where(filter, scope)?;
    let id_column = scope.descriptor().id_column();
    let query = scope
        .base_query()
        .filter(predicate)
        .field(format!("DISTINCT {}", id_column))
        .order_by(id_column)
        .build();

    row::query_ids(conn, &query)
}
