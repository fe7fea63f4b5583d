//! Generic find: paginated, joined and counted read

use super::row::{query_rows, to_sql, Row};
use super::{EntityMaps, FindResult};
use crate::error::{StoreError, StoreResult};
use crate::registry::{Entity, EntityScope, ScopeField};
use plantjournal_query::{compile_where, Criteria, Predicate, SelectQuery};
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) fn find(
    conn: &Connection,
    scope: &EntityScope,
    criteria: &Criteria,
    default_limit: u64,
) -> StoreResult<FindResult> {
    let entity = scope.entity();
    let id_column = scope.descriptor().id_column();

    let predicate = compile_where(criteria.filter.as_ref(), scope)?;
    let filtered = scope.base_query().filter(predicate);

    // Split off before pagination so the count covers every match
    let count_query = filtered.count(&format!("DISTINCT {}", id_column)).build();

    let selected = select_fields(scope, criteria.fields.as_deref())?;
    let mut rows_query = filtered.fields(selected.iter().map(|f| f.select.clone()));
    if scope.grouped() {
        rows_query = rows_query.group_by(id_column.as_str());
    }
    let offset = criteria.offset.unwrap_or(0);
    let rows_query = rows_query
        .order_by(id_column.as_str())
        .limit(Some(criteria.limit.unwrap_or(default_limit)))
        .offset(Some(offset))
        .build();

    debug!(entity = %entity, sql = %rows_query.sql, params = rows_query.params.len(), "find");

    let count: i64 = conn.query_row(
        &count_query.sql,
        params_from_iter(to_sql(&count_query.params)),
        |row| row.get(0),
    )?;
    let count = u64::try_from(count).unwrap_or(0);

    let decoders: Vec<_> = selected.iter().map(|f| f.decode).collect();
    let rows = query_rows(conn, &rows_query, &decoders)?;
    let returned = rows.len() as u64;

    let entities = assemble(scope, &selected, rows);
    let remaining = count.saturating_sub(offset.saturating_add(returned));

    debug!(entity = %entity, count, returned, remaining, "find complete");

    Ok(FindResult {
        count,
        remaining,
        entities,
    })
}

/// Rows of one entity by id, with every own field of that entity
pub(crate) fn fetch_by_ids(
    conn: &Connection,
    scope: &EntityScope,
    ids: &[i64],
) -> StoreResult<BTreeMap<i64, Row>> {
    let entity = scope.entity();
    let d = scope.descriptor();
    let selected: Vec<&ScopeField> = scope.own_fields(entity).collect();

    let query = SelectQuery::from(d.table)
        .fields(selected.iter().map(|f| f.select.clone()))
        .filter(Predicate::id_in(&d.id_column(), ids))
        .order_by(d.id_column())
        .build();

    let decoders: Vec<_> = selected.iter().map(|f| f.decode).collect();
    let rows = query_rows(conn, &query, &decoders)?;

    let mut entities = assemble(scope, &selected, rows);
    Ok(entities.remove(entity.plural()).unwrap_or_default())
}

/// Requested fields plus every member's id, in scope order
fn select_fields<'a>(
    scope: &'a EntityScope,
    requested: Option<&[String]>,
) -> StoreResult<Vec<&'a ScopeField>> {
    let Some(requested) = requested else {
        return Ok(scope.fields().iter().collect());
    };

    if let Some(unknown) = requested.iter().find(|alias| !scope.is_selectable(alias)) {
        return Err(StoreError::validation(format!(
            "criteria.fields: unknown field {}",
            unknown
        )));
    }

    Ok(scope
        .fields()
        .iter()
        .filter(|f| {
            f.alias == f.owner.descriptor().id || requested.iter().any(|r| r == f.alias)
        })
        .collect())
}

/// Split flat rows into one id-keyed map per scope member.
///
/// The target's map is always present; ancestor maps only when a joined
/// ancestor row exists.
fn assemble(scope: &EntityScope, selected: &[&ScopeField], rows: Vec<Vec<Value>>) -> EntityMaps {
    let mut entities = EntityMaps::new();
    entities.insert(scope.entity().plural(), BTreeMap::new());

    for member in scope.members() {
        let id_alias = member.descriptor().id;
        let Some(id_index) = selected
            .iter()
            .position(|f| f.owner == *member && f.alias == id_alias)
        else {
            continue;
        };

        for values in &rows {
            let Some(id) = values.get(id_index).and_then(Value::as_i64) else {
                continue;
            };
            let row = member_row(*member, selected, values);
            entities.entry(member.plural()).or_default().insert(id, row);
        }
    }

    entities
}

fn member_row(member: Entity, selected: &[&ScopeField], values: &[Value]) -> Row {
    selected
        .iter()
        .zip(values)
        .filter(|(field, _)| field.owner == member)
        .map(|(field, value)| (field.alias.to_string(), value.clone()))
        .collect()
}
