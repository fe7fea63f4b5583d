//! Async plant journal store

use crate::clock::Clock;
use crate::config::SqliteConfig;
use crate::connection::SqlitePool;
use crate::crud::{self, AffectedIds, CreateResult, FindResult};
use crate::error::{StoreError, StoreResult};
use crate::registry::{Entity, SchemaRegistry};
use plantjournal_query::Criteria;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Entry point for every read and write.
///
/// Cheap to clone; clones share the connection, registry and clock. Each
/// operation runs its whole statement sequence on the blocking pool while
/// holding the connection, so operations never interleave.
#[derive(Clone)]
pub struct PlantJournal {
    pool: SqlitePool,
    registry: Arc<SchemaRegistry>,
    clock: Arc<Clock>,
}

impl PlantJournal {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            registry: Arc::new(SchemaRegistry::new()),
            clock: Arc::new(Clock::new()),
        }
    }

    /// Open (and migrate) the database described by `config`
    pub fn open(config: SqliteConfig) -> StoreResult<Self> {
        Ok(Self::new(SqlitePool::new(config)?))
    }

    /// Fresh in-memory store
    pub fn memory() -> StoreResult<Self> {
        Ok(Self::new(SqlitePool::memory()?))
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Paginated read of `entity` with its ancestors
    pub async fn find(&self, entity: Entity, criteria: Criteria) -> StoreResult<FindResult> {
        let pool = self.pool.clone();
        let registry = self.registry.clone();
        let default_limit = self.pool.config().default_limit;

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                crud::find::find(conn, registry.scope(entity), &criteria, default_limit)
            })
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Create one row, plus any ancestors the options call for
    pub async fn create(&self, entity: Entity, options: Value) -> StoreResult<CreateResult> {
        self.create_many(entity, options, 1).await
    }

    /// Create `count` identical rows sharing one set of ancestors
    pub async fn create_many(
        &self,
        entity: Entity,
        options: Value,
        count: usize,
    ) -> StoreResult<CreateResult> {
        let options = into_object(options, "options")?;
        let pool = self.pool.clone();
        let registry = self.registry.clone();
        let clock = self.clock.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                crud::create::create(conn, &registry, &clock, entity, &options, count)
            })
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Apply `patch` to every row matching `criteria.where`
    pub async fn update(
        &self,
        entity: Entity,
        patch: Value,
        criteria: Criteria,
    ) -> StoreResult<AffectedIds> {
        let patch = into_object(patch, "patch")?;
        let pool = self.pool.clone();
        let registry = self.registry.clone();
        let clock = self.clock.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                crud::update::update(conn, registry.scope(entity), &clock, &patch, &criteria)
            })
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Delete every row matching `criteria.where` and their dependents
    pub async fn delete(&self, entity: Entity, criteria: Criteria) -> StoreResult<AffectedIds> {
        let pool = self.pool.clone();
        let registry = self.registry.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                crud::delete::delete(conn, registry.scope(entity), &criteria)
            })
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn into_object(value: Value, name: &str) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::validation(format!(
            "{} has to be an object, got {}",
            name, other
        ))),
    }
}
