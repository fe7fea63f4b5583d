//! Per-entity alias scopes
//!
//! A scope covers the target entity and its ancestor chain. It owns the join
//! clauses, the selectable fields of every member, and the alias table the
//! criteria compiler resolves filter keys against.

use super::{Entity, EntityDescriptor};
use plantjournal_query::{AliasScope, FilterTarget, SelectQuery};
use std::collections::HashMap;

/// How a selected column is turned back into JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// Storage class maps directly
    Plain,
    /// Sanitized JSON payload
    Json,
    /// Comma separated ids from `group_concat`, sorted, `[]` when NULL
    IdList,
}

/// One selectable column of a scope member
#[derive(Debug, Clone)]
pub struct ScopeField {
    pub owner: Entity,
    pub alias: &'static str,
    /// SQL expression selecting the value
    pub select: String,
    pub decode: Decode,
}

#[derive(Debug)]
pub struct EntityScope {
    entity: Entity,
    members: Vec<Entity>,
    joins: Vec<String>,
    fields: Vec<ScopeField>,
    filters: HashMap<&'static str, FilterTarget>,
    grouped: bool,
}

impl EntityScope {
    pub(super) fn build(entity: Entity) -> Self {
        let members = entity.chain();
        let mut joins = Vec::new();
        let mut grouped = false;

        for pair in members.windows(2) {
            let child = pair[0].descriptor();
            let parent = pair[1].descriptor();
            if let Some(link) = child.parent {
                joins.push(format!(
                    "LEFT JOIN {0} ON {0}.{1} = {2}.{3}",
                    parent.table, parent.id, child.table, link.foreign_key
                ));
            }
        }

        let mut fields = Vec::new();
        let mut filters = HashMap::new();

        for member in &members {
            let d = member.descriptor();

            let mut push = |field: ScopeField, filter: Option<FilterTarget>| {
                if let Some(target) = filter {
                    filters.entry(field.alias).or_insert(target);
                }
                fields.push(field);
            };

            push(
                plain(*member, d.id, d.id_column()),
                Some(FilterTarget::plain(d.table, d.id)),
            );

            for attr in d.attributes {
                let (decode, target) = match attr.ty {
                    super::AttrType::Json => (Decode::Json, FilterTarget::json(d.table, attr.alias)),
                    _ => (Decode::Plain, FilterTarget::plain(d.table, attr.alias)),
                };
                push(
                    ScopeField {
                        owner: *member,
                        alias: attr.alias,
                        select: format!("{}.{}", d.table, attr.alias),
                        decode,
                    },
                    Some(target),
                );
            }

            if let Some(link) = d.link {
                grouped = true;
                joins.push(format!(
                    "LEFT JOIN {0} ON {0}.{1} = {2}.{3}",
                    link.table, link.owner_column, d.table, d.id
                ));
                push(
                    ScopeField {
                        owner: *member,
                        alias: link.alias,
                        select: format!(
                            "(SELECT group_concat(l.{}) FROM {} AS l WHERE l.{} = {})",
                            link.target_column,
                            link.table,
                            link.owner_column,
                            d.id_column()
                        ),
                        decode: Decode::IdList,
                    },
                    Some(FilterTarget::plain(link.table, link.target_column)),
                );
            }

            for child in d.children {
                let Some(list_alias) = child.list_alias else {
                    continue;
                };
                let c = child.entity.descriptor();
                push(
                    ScopeField {
                        owner: *member,
                        alias: list_alias,
                        select: format!(
                            "(SELECT group_concat(c.{}) FROM {} AS c WHERE c.{} = {})",
                            c.id,
                            c.table,
                            child.foreign_key,
                            d.id_column()
                        ),
                        decode: Decode::IdList,
                    },
                    None,
                );
            }

            push(
                plain(*member, d.created_at, format!("{}.{}", d.table, d.created_at)),
                Some(FilterTarget::plain(d.table, d.created_at)),
            );
            push(
                plain(*member, d.modified_at, format!("{}.{}", d.table, d.modified_at)),
                Some(FilterTarget::plain(d.table, d.modified_at)),
            );
        }

        Self {
            entity,
            members,
            joins,
            fields,
            filters,
            grouped,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.entity.descriptor()
    }

    /// Target first, then ancestors nearest first
    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    pub fn fields(&self) -> &[ScopeField] {
        &self.fields
    }

    /// Fields belonging to one member
    pub fn own_fields(&self, owner: Entity) -> impl Iterator<Item = &ScopeField> {
        self.fields.iter().filter(move |f| f.owner == owner)
    }

    pub fn is_selectable(&self, alias: &str) -> bool {
        self.fields.iter().any(|f| f.alias == alias)
    }

    /// Whether a joined link table can fan out rows
    pub fn grouped(&self) -> bool {
        self.grouped
    }

    /// `FROM target` plus every join, without fields or filters
    pub fn base_query(&self) -> SelectQuery {
        self.joins
            .iter()
            .fold(SelectQuery::from(self.descriptor().table), |q, join| {
                q.join(join.as_str())
            })
    }
}

impl AliasScope for EntityScope {
    fn resolve(&self, alias: &str) -> Option<FilterTarget> {
        self.filters.get(alias).copied()
    }
}

fn plain(owner: Entity, alias: &'static str, select: String) -> ScopeField {
    ScopeField {
        owner,
        alias,
        select,
        decode: Decode::Plain,
    }
}
