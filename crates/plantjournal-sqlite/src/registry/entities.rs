//! Entity descriptors

use super::hooks::{JournalHooks, NoHooks, PlantHooks};
use super::{
    AttrType, Attribute, ChildRelation, Entity, EntityDescriptor, LinkRelation, OnDelete,
    ParentLink, Presence,
};

const PLANT_SEXES: &[&str] = &["male", "female", "hermaphrodite"];

pub(super) static FAMILY: EntityDescriptor = EntityDescriptor {
    entity: Entity::Family,
    table: "families",
    id: "familyId",
    created_at: "familyCreatedAt",
    modified_at: "familyModifiedAt",
    attributes: &[
        Attribute::new("familyName", AttrType::Text, Presence::Required),
        Attribute::new("familyDescription", AttrType::Text, Presence::Default("")),
    ],
    parent: None,
    link: None,
    children: &[ChildRelation {
        entity: Entity::Generation,
        foreign_key: "familyId",
        list_alias: Some("familyGenerations"),
        on_delete: OnDelete::Cascade,
    }],
    hooks: &NoHooks,
};

pub(super) static GENERATION: EntityDescriptor = EntityDescriptor {
    entity: Entity::Generation,
    table: "generations",
    id: "generationId",
    created_at: "generationCreatedAt",
    modified_at: "generationModifiedAt",
    attributes: &[
        Attribute::new("generationName", AttrType::Text, Presence::Required),
        Attribute::new(
            "generationDescription",
            AttrType::Text,
            Presence::Default(""),
        ),
        Attribute::new(
            "familyId",
            AttrType::Reference(Entity::Family),
            Presence::Required,
        ),
    ],
    parent: Some(ParentLink {
        entity: Entity::Family,
        foreign_key: "familyId",
        required: true,
    }),
    link: Some(LinkRelation {
        alias: "generationParents",
        table: "generation_parents",
        owner_column: "generationId",
        target_column: "plantId",
        target: Entity::Plant,
    }),
    children: &[ChildRelation {
        entity: Entity::Genotype,
        foreign_key: "generationId",
        list_alias: Some("generationGenotypes"),
        on_delete: OnDelete::Cascade,
    }],
    hooks: &NoHooks,
};

pub(super) static GENOTYPE: EntityDescriptor = EntityDescriptor {
    entity: Entity::Genotype,
    table: "genotypes",
    id: "genotypeId",
    created_at: "genotypeCreatedAt",
    modified_at: "genotypeModifiedAt",
    attributes: &[
        Attribute::new("genotypeName", AttrType::Text, Presence::Default("")),
        Attribute::new("genotypeDescription", AttrType::Text, Presence::Default("")),
        Attribute::new(
            "generationId",
            AttrType::Reference(Entity::Generation),
            Presence::Nullable,
        ),
    ],
    parent: Some(ParentLink {
        entity: Entity::Generation,
        foreign_key: "generationId",
        required: false,
    }),
    link: None,
    children: &[ChildRelation {
        entity: Entity::Plant,
        foreign_key: "genotypeId",
        list_alias: Some("genotypePlants"),
        on_delete: OnDelete::Cascade,
    }],
    hooks: &NoHooks,
};

pub(super) static PLANT: EntityDescriptor = EntityDescriptor {
    entity: Entity::Plant,
    table: "plants",
    id: "plantId",
    created_at: "plantCreatedAt",
    modified_at: "plantModifiedAt",
    attributes: &[
        Attribute::new("plantName", AttrType::Text, Presence::Required),
        Attribute::new(
            "plantSex",
            AttrType::Choice(PLANT_SEXES),
            Presence::Nullable,
        ),
        Attribute::new("plantDescription", AttrType::Text, Presence::Default("")),
        Attribute::new(
            "plantClonedFrom",
            AttrType::Reference(Entity::Plant),
            Presence::Nullable,
        ),
        Attribute::new(
            "genotypeId",
            AttrType::Reference(Entity::Genotype),
            Presence::Required,
        ),
        Attribute::new(
            "mediumId",
            AttrType::Reference(Entity::Medium),
            Presence::Nullable,
        ),
    ],
    parent: Some(ParentLink {
        entity: Entity::Genotype,
        foreign_key: "genotypeId",
        required: true,
    }),
    link: None,
    children: &[
        ChildRelation {
            entity: Entity::Plant,
            foreign_key: "plantClonedFrom",
            list_alias: Some("plantClones"),
            on_delete: OnDelete::Detach,
        },
        ChildRelation {
            entity: Entity::Journal,
            foreign_key: "plantId",
            list_alias: None,
            on_delete: OnDelete::Cascade,
        },
    ],
    hooks: &PlantHooks,
};

pub(super) static ENVIRONMENT: EntityDescriptor = EntityDescriptor {
    entity: Entity::Environment,
    table: "environments",
    id: "environmentId",
    created_at: "environmentCreatedAt",
    modified_at: "environmentModifiedAt",
    attributes: &[
        Attribute::new("environmentName", AttrType::Text, Presence::Required),
        Attribute::new(
            "environmentDescription",
            AttrType::Text,
            Presence::Default(""),
        ),
    ],
    parent: None,
    link: None,
    children: &[
        ChildRelation {
            entity: Entity::Medium,
            foreign_key: "environmentId",
            list_alias: Some("environmentMediums"),
            on_delete: OnDelete::Cascade,
        },
        ChildRelation {
            entity: Entity::Journal,
            foreign_key: "environmentId",
            list_alias: None,
            on_delete: OnDelete::Cascade,
        },
    ],
    hooks: &NoHooks,
};

pub(super) static MEDIUM: EntityDescriptor = EntityDescriptor {
    entity: Entity::Medium,
    table: "mediums",
    id: "mediumId",
    created_at: "mediumCreatedAt",
    modified_at: "mediumModifiedAt",
    attributes: &[
        Attribute::new("mediumName", AttrType::Text, Presence::Required),
        Attribute::new("mediumDescription", AttrType::Text, Presence::Default("")),
        Attribute::new(
            "environmentId",
            AttrType::Reference(Entity::Environment),
            Presence::Nullable,
        ),
    ],
    parent: Some(ParentLink {
        entity: Entity::Environment,
        foreign_key: "environmentId",
        required: false,
    }),
    link: None,
    children: &[
        ChildRelation {
            entity: Entity::Plant,
            foreign_key: "mediumId",
            list_alias: Some("mediumPlants"),
            on_delete: OnDelete::Detach,
        },
        ChildRelation {
            entity: Entity::Journal,
            foreign_key: "mediumId",
            list_alias: None,
            on_delete: OnDelete::Cascade,
        },
    ],
    hooks: &NoHooks,
};

pub(super) static JOURNAL: EntityDescriptor = EntityDescriptor {
    entity: Entity::Journal,
    table: "journals",
    id: "journalId",
    created_at: "journalCreatedAt",
    modified_at: "journalModifiedAt",
    attributes: &[
        Attribute::new("journalDatetime", AttrType::Integer, Presence::Required),
        Attribute::new("journalType", AttrType::Text, Presence::Required),
        Attribute::new("journalValue", AttrType::Json, Presence::Required),
        Attribute::new(
            "plantId",
            AttrType::Reference(Entity::Plant),
            Presence::Nullable,
        ),
        Attribute::new(
            "mediumId",
            AttrType::Reference(Entity::Medium),
            Presence::Nullable,
        ),
        Attribute::new(
            "environmentId",
            AttrType::Reference(Entity::Environment),
            Presence::Nullable,
        ),
    ],
    parent: None,
    link: None,
    children: &[],
    hooks: &JournalHooks,
};
