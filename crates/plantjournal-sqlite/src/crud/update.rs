//! Generic update
//!
//! Targets are resolved with the find filter path (no pagination). Link
//! attributes are applied with [`replace_link_set`], column attributes with
//! one UPDATE that also stamps the modification time.

use super::row::to_sql;
use super::{
    bind_attribute, check_id_list, check_value, reference_checks, resolve_ids, translate_write_error,
    AffectedIds, ReferenceCheck,
};
use crate::clock::Clock;
use crate::error::{StoreError, StoreResult};
use crate::registry::{EntityScope, LinkRelation};
use plantjournal_query::{Criteria, Predicate, SqlParam};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const SOURCE: &str = "patch";

pub(crate) fn update(
    conn: &mut Connection,
    scope: &EntityScope,
    clock: &Clock,
    patch: &Map<String, Value>,
    criteria: &Criteria,
) -> StoreResult<AffectedIds> {
    let entity = scope.entity();
    let d = scope.descriptor();

    if patch.is_empty() {
        return Err(StoreError::validation(
            "patch has to contain at least one attribute",
        ));
    }

    let mut link_targets = None;
    for (key, value) in patch {
        if let Some(attr) = d.attribute(key) {
            check_value(attr, value, SOURCE)?;
        } else if let Some(link) = d.link.filter(|l| l.alias == key) {
            link_targets = Some((link, check_id_list(link.alias, value, SOURCE)?));
        } else if d.is_managed(key) {
            return Err(StoreError::validation(format!(
                "{}.{} can not be updated",
                SOURCE, key
            )));
        } else {
            return Err(StoreError::validation(format!(
                "{}.{} is not an attribute of {}",
                SOURCE, key, entity
            )));
        }
    }

    let mut patch = patch.clone();
    d.hooks.prepare_update(&mut patch)?;

    let ids = resolve_ids(conn, scope, criteria.filter.as_ref())?;
    if ids.is_empty() {
        debug!(entity = %entity, "update matched nothing");
        return Ok(AffectedIds::new(entity, ids));
    }

    if let Some((link, targets)) = &link_targets {
        replace_link_set(conn, *link, &ids, targets)?;
    }

    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for attr in d.attributes {
        if let Some(value) = patch.get(attr.alias) {
            assignments.push(format!("{} = ?", attr.alias));
            params.push(bind_attribute(attr, value));
        }
    }
    assignments.push(format!("{} = ?", d.modified_at));
    params.push(SqlParam::Text(clock.timestamp()));

    let target = Predicate::id_in(&d.id_column(), &ids);
    params.extend(target.params);
    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        d.table,
        assignments.join(", "),
        target.sql
    );

    debug!(entity = %entity, sql = %sql, rows = ids.len(), "update");

    if let Err(err) = conn.execute(&sql, params_from_iter(to_sql(&params))) {
        let checks = reference_checks(d.attributes, &patch, SOURCE);
        return Err(translate_write_error(conn, err, &checks));
    }

    Ok(AffectedIds::new(entity, ids))
}

/// Replace the complete link set of every owner with `targets`.
///
/// Runs in its own transaction: either every owner ends up linked to exactly
/// `targets`, or the previous links are left untouched and the dangling
/// target is reported.
pub(crate) fn replace_link_set(
    conn: &mut Connection,
    link: LinkRelation,
    owners: &[i64],
    targets: &[i64],
) -> StoreResult<()> {
    let tx = conn.transaction()?;

    let owned = Predicate::id_in(link.owner_column, owners);
    tx.execute(
        &format!("DELETE FROM {} WHERE {}", link.table, owned.sql),
        params_from_iter(to_sql(&owned.params)),
    )?;

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} ({}, {}) VALUES (?, ?)",
            link.table, link.owner_column, link.target_column
        ))?;
        for owner in owners {
            for target in targets {
                if let Err(err) = stmt.execute([*owner, *target]) {
                    let check = ReferenceCheck::new(SOURCE, link.alias, link.target, *target);
                    let err = translate_write_error(&tx, err, &[check]);
                    warn!(link = link.table, error = %err, "link replacement rolled back");
                    return Err(err);
                }
            }
        }
    }

    tx.commit()?;
    debug!(
        link = link.table,
        owners = owners.len(),
        targets = targets.len(),
        "link set replaced"
    );
    Ok(())
}
