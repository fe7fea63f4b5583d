//! Per-entity customization points for the generic CRUD templates

use crate::error::{StoreError, StoreResult};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};

/// Strategy invoked by the generic create/update templates.
///
/// Every method has a no-op default; entities override only what they need.
pub trait EntityHooks: Send + Sync {
    /// Checks spanning several attributes, run after per-attribute validation
    fn validate_create(&self, _options: &Map<String, Value>) -> StoreResult<()> {
        Ok(())
    }

    /// Whether the parent id can be derived from other options instead of
    /// creating a parent row
    fn derives_parent(&self, _options: &Map<String, Value>) -> bool {
        false
    }

    /// Look up the derived parent id inside the create transaction
    fn derive_parent(
        &self,
        _conn: &Connection,
        _options: &Map<String, Value>,
    ) -> StoreResult<Option<i64>> {
        Ok(None)
    }

    /// Rewrite an already validated patch before it is applied
    fn prepare_update(&self, _patch: &mut Map<String, Value>) -> StoreResult<()> {
        Ok(())
    }
}

pub(crate) struct NoHooks;

impl EntityHooks for NoHooks {}

/// Clones inherit the mother plant's genotype
pub(crate) struct PlantHooks;

impl EntityHooks for PlantHooks {
    fn derives_parent(&self, options: &Map<String, Value>) -> bool {
        is_set(options, "plantClonedFrom") && !is_set(options, "genotypeId")
    }

    fn derive_parent(
        &self,
        conn: &Connection,
        options: &Map<String, Value>,
    ) -> StoreResult<Option<i64>> {
        let Some(mother) = options.get("plantClonedFrom").and_then(Value::as_i64) else {
            return Ok(None);
        };

        let genotype: Option<i64> = conn
            .query_row(
                "SELECT genotypeId FROM plants WHERE plantId = ?",
                [mother],
                |row| row.get(0),
            )
            .optional()?;

        genotype
            .map(Some)
            .ok_or_else(|| StoreError::Reference {
                reference: "options.plantClonedFrom".to_string(),
                target: "Plant",
            })
    }
}

const JOURNAL_REFERENCES: [&str; 3] = ["plantId", "mediumId", "environmentId"];

/// A journal belongs to exactly one plant, medium or environment
pub(crate) struct JournalHooks;

impl EntityHooks for JournalHooks {
    fn validate_create(&self, options: &Map<String, Value>) -> StoreResult<()> {
        let set = JOURNAL_REFERENCES
            .iter()
            .filter(|r| is_set(options, r))
            .count();
        if set != 1 {
            return Err(exactly_one());
        }
        Ok(())
    }

    fn prepare_update(&self, patch: &mut Map<String, Value>) -> StoreResult<()> {
        let given: Vec<&str> = JOURNAL_REFERENCES
            .iter()
            .copied()
            .filter(|r| patch.contains_key(*r))
            .collect();

        match given.as_slice() {
            [] => Ok(()),
            [reference] => {
                if !is_set(patch, reference) {
                    return Err(exactly_one());
                }
                for other in JOURNAL_REFERENCES.iter().filter(|r| *r != reference) {
                    patch.insert((*other).to_string(), Value::Null);
                }
                Ok(())
            }
            _ => Err(exactly_one()),
        }
    }
}

fn exactly_one() -> StoreError {
    StoreError::validation(
        "exactly one of options.plantId, options.mediumId and options.environmentId has to be set",
    )
}

fn is_set(options: &Map<String, Value>, key: &str) -> bool {
    options.get(key).is_some_and(|v| !v.is_null())
}
