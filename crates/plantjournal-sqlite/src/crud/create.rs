//! Generic create with ancestor resolution
//!
//! Creating an entity can create its missing ancestors in the same
//! transaction. The levels to create are planned up front by walking the
//! fixed ancestor chain once; a level stops the walk when its parent is
//! anchored by a foreign key (or derived by a hook), otherwise the parent is
//! created first when it is mandatory or the options mention any of its
//! attributes.

use super::find::fetch_by_ids;
use super::row::to_sql;
use super::{
    bind_attribute, check_id_list, check_value, reference_checks, translate_write_error,
    CreateResult, ReferenceCheck,
};
use crate::clock::Clock;
use crate::error::{StoreError, StoreResult};
use crate::registry::{Entity, EntityDescriptor, LinkRelation, Presence, SchemaRegistry};
use plantjournal_query::SqlParam;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const SOURCE: &str = "options";

pub(crate) fn create(
    conn: &mut Connection,
    registry: &SchemaRegistry,
    clock: &Clock,
    entity: Entity,
    options: &Map<String, Value>,
    copies: usize,
) -> StoreResult<CreateResult> {
    if copies == 0 {
        return Err(StoreError::validation("count has to be at least 1"));
    }

    let chain = entity.chain();
    let levels = plan_levels(&chain, options)?;
    validate_levels(&levels, options)?;

    debug!(entity = %entity, levels = ?levels, copies, "create");

    let tx = conn.transaction()?;
    let mut created = Vec::with_capacity(levels.len());
    let mut parent_id: Option<i64> = None;

    // Top-most ancestor first, so each level can point at the one above
    for level in levels.iter().rev() {
        let d = level.descriptor();
        let anchor = match parent_id {
            Some(id) => Some(id),
            None if d.hooks.derives_parent(options) => d.hooks.derive_parent(&tx, options)?,
            None => None,
        };
        let count = if *level == entity { copies } else { 1 };
        let ids = insert_rows(&tx, d, options, anchor, count, clock)?;

        parent_id = ids.first().copied();
        created.push((*level, ids));
    }

    let mut result = CreateResult::default();
    for (level, ids) in &created {
        let rows = fetch_by_ids(&tx, registry.scope(*level), ids)?;
        result.entities.insert(level.plural(), rows);
    }

    tx.commit()?;

    debug!(entity = %entity, ids = ?result.ids(entity), "create complete");
    Ok(result)
}

/// Index in the chain of the entity owning an option key
fn owner_index(chain: &[Entity], key: &str) -> Option<usize> {
    chain.iter().position(|e| {
        let d = e.descriptor();
        d.attribute(key).is_some() || d.link.is_some_and(|l| l.alias == key)
    })
}

/// Entities to insert, target first
fn plan_levels(chain: &[Entity], options: &Map<String, Value>) -> StoreResult<Vec<Entity>> {
    let mut owners = Vec::with_capacity(options.len());
    for key in options.keys() {
        match owner_index(chain, key) {
            Some(index) => owners.push((key, index)),
            None => {
                return Err(StoreError::validation(format!(
                    "{}.{} is not an attribute of {} or its ancestors",
                    SOURCE, key, chain[0]
                )))
            }
        }
    }

    let mut levels = vec![chain[0]];
    for (index, pair) in chain.windows(2).enumerate() {
        let child = pair[0].descriptor();
        let Some(parent) = child.parent else {
            break;
        };
        if is_set(options, parent.foreign_key) || child.hooks.derives_parent(options) {
            break;
        }
        let requested = owners.iter().any(|(_, owner)| *owner > index);
        if !(parent.required || requested) {
            break;
        }
        levels.push(pair[1]);
    }

    // Attributes of ancestors above an anchored level would be dropped
    if let Some((key, _)) = owners.iter().find(|(_, owner)| *owner >= levels.len()) {
        return Err(StoreError::validation(format!(
            "{}.{} can not be combined with an existing parent reference",
            SOURCE, key
        )));
    }

    Ok(levels)
}

fn validate_levels(levels: &[Entity], options: &Map<String, Value>) -> StoreResult<()> {
    for (index, level) in levels.iter().enumerate() {
        let d = level.descriptor();
        let planned_parent = index + 1 < levels.len() || d.hooks.derives_parent(options);

        for attr in d.attributes {
            match options.get(attr.alias) {
                Some(value) => check_value(attr, value, SOURCE)?,
                None => {
                    let supplied = planned_parent
                        && d.parent.is_some_and(|p| p.foreign_key == attr.alias);
                    if attr.presence == Presence::Required && !supplied {
                        return Err(StoreError::validation(format!(
                            "{}.{} has to be set",
                            SOURCE, attr.alias
                        )));
                    }
                }
            }
        }

        if let Some(link) = d.link {
            if let Some(value) = options.get(link.alias) {
                check_id_list(link.alias, value, SOURCE)?;
            }
        }

        d.hooks.validate_create(options)?;
    }
    Ok(())
}

fn insert_rows(
    conn: &Connection,
    d: &EntityDescriptor,
    options: &Map<String, Value>,
    anchor: Option<i64>,
    count: usize,
    clock: &Clock,
) -> StoreResult<Vec<i64>> {
    let fk = d.parent.map(|p| p.foreign_key);

    let mut columns = Vec::with_capacity(d.attributes.len() + 2);
    let mut params = Vec::with_capacity(d.attributes.len() + 2);
    for attr in d.attributes {
        let param = match (anchor, options.get(attr.alias)) {
            (Some(id), _) if fk == Some(attr.alias) => SqlParam::Integer(id),
            (_, Some(value)) => bind_attribute(attr, value),
            (_, None) => match attr.presence {
                Presence::Default(text) => SqlParam::Text(text.to_string()),
                _ => SqlParam::Null,
            },
        };
        columns.push(attr.alias);
        params.push(param);
    }
    columns.push(d.created_at);
    columns.push(d.modified_at);

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        d.table,
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    );
    let checks = reference_checks(d.attributes, options, SOURCE);

    let link_targets = match d.link {
        Some(link) => match options.get(link.alias) {
            Some(value) => check_id_list(link.alias, value, SOURCE)?,
            None => Vec::new(),
        },
        None => Vec::new(),
    };

    let mut ids = Vec::with_capacity(count);
    let mut stmt = conn.prepare(&sql)?;
    for _ in 0..count {
        let timestamp = clock.timestamp();
        let mut values = to_sql(&params);
        values.push(SqlValue::Text(timestamp.clone()));
        values.push(SqlValue::Text(timestamp));

        if let Err(err) = stmt.execute(params_from_iter(values)) {
            let err = translate_write_error(conn, err, &checks);
            if err.is_reference() {
                warn!(entity = %d.entity, error = %err, "create rolled back");
            }
            return Err(err);
        }
        let id = conn.last_insert_rowid();

        if let Some(link) = d.link {
            insert_links(conn, link, id, &link_targets)?;
        }
        ids.push(id);
    }

    Ok(ids)
}

fn insert_links(
    conn: &Connection,
    link: LinkRelation,
    owner: i64,
    targets: &[i64],
) -> StoreResult<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} ({}, {}) VALUES (?, ?)",
        link.table, link.owner_column, link.target_column
    ))?;
    for target in targets {
        if let Err(err) = stmt.execute([owner, *target]) {
            let check = ReferenceCheck::new(SOURCE, link.alias, link.target, *target);
            let err = translate_write_error(conn, err, &[check]);
            warn!(link = link.table, error = %err, "create rolled back");
            return Err(err);
        }
    }
    Ok(())
}

fn is_set(options: &Map<String, Value>, key: &str) -> bool {
    options.get(key).is_some_and(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_plan_creates_required_ancestors() {
        let chain = Entity::Plant.chain();
        let levels = plan_levels(
            &chain,
            &options(json!({"plantName": "p", "familyName": "f", "generationName": "g"})),
        )
        .unwrap();
        assert_eq!(
            levels,
            vec![
                Entity::Plant,
                Entity::Genotype,
                Entity::Generation,
                Entity::Family
            ]
        );
    }

    #[test]
    fn test_plan_stops_at_optional_parent() {
        let chain = Entity::Plant.chain();
        let levels = plan_levels(&chain, &options(json!({"plantName": "p"}))).unwrap();
        assert_eq!(levels, vec![Entity::Plant, Entity::Genotype]);
    }

    #[test]
    fn test_plan_stops_at_anchor() {
        let chain = Entity::Plant.chain();
        let levels =
            plan_levels(&chain, &options(json!({"plantName": "p", "genotypeId": 3}))).unwrap();
        assert_eq!(levels, vec![Entity::Plant]);

        let levels = plan_levels(
            &chain,
            &options(json!({"plantName": "p", "plantClonedFrom": 3})),
        )
        .unwrap();
        assert_eq!(levels, vec![Entity::Plant]);
    }

    #[test]
    fn test_plan_rejects_unknown_and_orphaned_keys() {
        let chain = Entity::Family.chain();
        assert!(plan_levels(&chain, &options(json!({"familyId": 1}))).is_err());

        let chain = Entity::Genotype.chain();
        let err = plan_levels(
            &chain,
            &options(json!({"generationId": 1, "familyName": "f"})),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_validate_requires_attributes() {
        let err = validate_levels(&[Entity::Family], &options(json!({}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: options.familyName has to be set"
        );

        // familyId is supplied by the planned family row
        assert!(validate_levels(
            &[Entity::Generation, Entity::Family],
            &options(json!({"generationName": "F1", "familyName": "f"}))
        )
        .is_ok());
    }
}
