//! SQLite storage backend for the plant journal
//!
//! Generic create/find/update/delete over a small hierarchy of entities
//! (families, generations, genotypes, plants, environments, mediums and
//! journals), driven by a static schema registry and the criteria compiler
//! from `plantjournal-query`.
//!
//! ## Features
//!
//! - **Ancestor creation**: creating a plant can create its genotype,
//!   generation and family in the same transaction
//! - **Joined finds**: results carry the target rows and their ancestors,
//!   each keyed by id, plus total count and remaining rows
//! - **JSON filters**: dotted paths and `$has`/`$contains` operators on
//!   journal payloads
//! - **Atomic link replacement**: generation parents are swapped as a whole
//!   or not at all
//! - **Cascading delete**: dependents are removed and reported per entity
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plantjournal_sqlite::{Criteria, Entity, PlantJournal, SqliteConfig};
//! use serde_json::json;
//!
//! let journal = PlantJournal::open(SqliteConfig::new("./plants.db"))?;
//! let created = journal
//!     .create(Entity::Plant, json!({ "plantName": "Blue Dream #1", "familyName": "Blue Dream", "generationName": "F1" }))
//!     .await?;
//!
//! let found = journal
//!     .find(Entity::Plant, Criteria::filter(json!({ "familyName": { "$like": "Blue%" } })))
//!     .await?;
//! ```

pub mod clock;
pub mod config;
pub mod connection;
pub mod crud;
pub mod error;
pub mod registry;
pub mod schema;
pub mod store;

// Re-exports
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use crud::{AffectedIds, CreateResult, FindResult, Row};
pub use error::{StoreError, StoreResult};
pub use plantjournal_query::Criteria;
pub use registry::{Entity, SchemaRegistry};
pub use store::PlantJournal;
