//! Generic delete with cascading removal

use super::row::{query_ids, to_sql};
use super::{resolve_ids, AffectedIds};
use crate::error::StoreResult;
use crate::registry::{Entity, EntityScope, OnDelete};
use plantjournal_query::{Criteria, Predicate, SelectQuery};
use rusqlite::{params_from_iter, Connection};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// Children before parents
const DELETE_ORDER: [Entity; 7] = [
    Entity::Journal,
    Entity::Plant,
    Entity::Medium,
    Entity::Genotype,
    Entity::Generation,
    Entity::Environment,
    Entity::Family,
];

pub(crate) fn delete(
    conn: &mut Connection,
    scope: &EntityScope,
    criteria: &Criteria,
) -> StoreResult<AffectedIds> {
    let entity = scope.entity();
    let ids = resolve_ids(conn, scope, criteria.filter.as_ref())?;
    if ids.is_empty() {
        debug!(entity = %entity, "delete matched nothing");
        return Ok(AffectedIds::new(entity, ids));
    }

    let doomed = collect_cascade(conn, entity, &ids)?;

    let tx = conn.transaction()?;
    for victim in DELETE_ORDER {
        let Some(ids) = doomed.get(&victim) else {
            continue;
        };
        let d = victim.descriptor();
        let ids: Vec<i64> = ids.iter().copied().collect();
        let target = Predicate::id_in(d.id, &ids);
        tx.execute(
            &format!("DELETE FROM {} WHERE {}", d.table, target.sql),
            params_from_iter(to_sql(&target.params)),
        )?;
    }
    tx.commit()?;

    let mut affected = AffectedIds::new(entity, ids);
    for (victim, ids) in doomed {
        if victim != entity && !ids.is_empty() {
            affected.insert(victim, ids.into_iter().collect());
        }
    }

    debug!(entity = %entity, affected = ?affected, "delete complete");
    Ok(affected)
}

/// Breadth-first walk over cascading child relations
fn collect_cascade(
    conn: &Connection,
    entity: Entity,
    ids: &[i64],
) -> StoreResult<BTreeMap<Entity, BTreeSet<i64>>> {
    let mut doomed: BTreeMap<Entity, BTreeSet<i64>> = BTreeMap::new();
    doomed.insert(entity, ids.iter().copied().collect());

    let mut queue = VecDeque::from([(entity, ids.to_vec())]);
    while let Some((parent, parent_ids)) = queue.pop_front() {
        for child in parent.descriptor().children {
            if child.on_delete != OnDelete::Cascade {
                continue;
            }
            let c = child.entity.descriptor();
            let query = SelectQuery::from(c.table)
                .field(c.id)
                .filter(Predicate::id_in(child.foreign_key, &parent_ids))
                .build();

            let seen = doomed.entry(child.entity).or_default();
            let fresh: Vec<i64> = query_ids(conn, &query)?
                .into_iter()
                .filter(|id| seen.insert(*id))
                .collect();
            if !fresh.is_empty() {
                queue.push_back((child.entity, fresh));
            }
        }
    }

    Ok(doomed)
}
