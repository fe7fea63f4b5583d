//! Schema registry
//!
//! Static descriptors for every entity plus the per-entity alias scopes the
//! criteria compiler resolves against. Built once when the store opens and
//! shared by reference with every operation.

mod entities;
mod hooks;
mod scope;

pub use hooks::EntityHooks;
pub use scope::{Decode, EntityScope, ScopeField};

use serde::Serialize;
use std::fmt;

/// The closed set of stored entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Entity {
    Family,
    Generation,
    Genotype,
    Plant,
    Environment,
    Medium,
    Journal,
}

impl Entity {
    pub const ALL: [Entity; 7] = [
        Entity::Family,
        Entity::Generation,
        Entity::Genotype,
        Entity::Plant,
        Entity::Environment,
        Entity::Medium,
        Entity::Journal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Entity::Family => "Family",
            Entity::Generation => "Generation",
            Entity::Genotype => "Genotype",
            Entity::Plant => "Plant",
            Entity::Environment => "Environment",
            Entity::Medium => "Medium",
            Entity::Journal => "Journal",
        }
    }

    /// Key of this entity's map in results
    pub fn plural(self) -> &'static str {
        match self {
            Entity::Family => "families",
            Entity::Generation => "generations",
            Entity::Genotype => "genotypes",
            Entity::Plant => "plants",
            Entity::Environment => "environments",
            Entity::Medium => "mediums",
            Entity::Journal => "journals",
        }
    }

    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            Entity::Family => &entities::FAMILY,
            Entity::Generation => &entities::GENERATION,
            Entity::Genotype => &entities::GENOTYPE,
            Entity::Plant => &entities::PLANT,
            Entity::Environment => &entities::ENVIRONMENT,
            Entity::Medium => &entities::MEDIUM,
            Entity::Journal => &entities::JOURNAL,
        }
    }

    /// This entity followed by its ancestors, nearest first
    pub fn chain(self) -> Vec<Entity> {
        let mut chain = vec![self];
        let mut current = self;
        // The chain is at most as long as the entity list
        for _ in 0..Entity::ALL.len() {
            match current.descriptor().parent {
                Some(parent) => {
                    chain.push(parent.entity);
                    current = parent.entity;
                }
                None => break,
            }
        }
        chain
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column value type accepted on create and update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Text,
    Integer,
    /// Arbitrary JSON payload, stored sanitized
    Json,
    /// Foreign key to another entity's id
    Reference(Entity),
    /// Text restricted to a fixed set
    Choice(&'static [&'static str]),
}

/// What happens when an attribute is omitted on create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Default(&'static str),
    /// Omitted means NULL; explicit null is accepted
    Nullable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// Caller-facing alias, identical to the column name
    pub alias: &'static str,
    pub ty: AttrType,
    pub presence: Presence,
}

impl Attribute {
    pub const fn new(alias: &'static str, ty: AttrType, presence: Presence) -> Self {
        Self {
            alias,
            ty,
            presence,
        }
    }
}

/// Edge to the next entity up the ancestor chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub entity: Entity,
    /// Column in this entity's table holding the parent id
    pub foreign_key: &'static str,
    /// Whether a row must always have a parent
    pub required: bool,
}

/// Many-to-many relation stored in a link table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRelation {
    pub alias: &'static str,
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    pub target: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Child rows are removed with the parent
    Cascade,
    /// Child rows stay, their reference is nulled
    Detach,
}

/// Rows of another entity pointing at this one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRelation {
    pub entity: Entity,
    pub foreign_key: &'static str,
    /// Read-only id list reported on this entity, if any
    pub list_alias: Option<&'static str>,
    pub on_delete: OnDelete,
}

/// Static configuration of one entity
pub struct EntityDescriptor {
    pub entity: Entity,
    pub table: &'static str,
    pub id: &'static str,
    pub created_at: &'static str,
    pub modified_at: &'static str,
    pub attributes: &'static [Attribute],
    pub parent: Option<ParentLink>,
    pub link: Option<LinkRelation>,
    pub children: &'static [ChildRelation],
    pub hooks: &'static dyn EntityHooks,
}

impl EntityDescriptor {
    pub fn attribute(&self, alias: &str) -> Option<&'static Attribute> {
        self.attributes.iter().find(|a| a.alias == alias)
    }

    /// `table.id`
    pub fn id_column(&self) -> String {
        format!("{}.{}", self.table, self.id)
    }

    pub fn is_managed(&self, alias: &str) -> bool {
        alias == self.id || alias == self.created_at || alias == self.modified_at
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("entity", &self.entity)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Alias scopes for every entity, built once
#[derive(Debug)]
pub struct SchemaRegistry {
    scopes: Vec<EntityScope>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let scopes = Entity::ALL.iter().map(|e| EntityScope::build(*e)).collect();
        Self { scopes }
    }

    pub fn scope(&self, entity: Entity) -> &EntityScope {
        &self.scopes[entity.index()]
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
