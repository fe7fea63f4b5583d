//! Schema management and migrations

use crate::error::{StoreError, StoreResult};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Applying schema migrations"
        );
        apply_migration_v1(conn)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> StoreResult<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .optional()?
        .flatten();

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: entity tables, generation parents link table, journals
fn apply_migration_v1(conn: &Connection) -> StoreResult<()> {
    debug!("Applying migration v1: plant journal schema");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| StoreError::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

const SCHEMA_V1: &str = r#"
-- ============================================================================
-- Genealogy: families -> generations -> genotypes -> plants
-- ============================================================================

CREATE TABLE IF NOT EXISTS families (
    familyId INTEGER PRIMARY KEY AUTOINCREMENT,
    familyName TEXT NOT NULL,
    familyDescription TEXT NOT NULL DEFAULT '',
    familyCreatedAt TEXT NOT NULL,
    familyModifiedAt TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS generations (
    generationId INTEGER PRIMARY KEY AUTOINCREMENT,
    generationName TEXT NOT NULL,
    generationDescription TEXT NOT NULL DEFAULT '',
    familyId INTEGER NOT NULL REFERENCES families(familyId) ON DELETE CASCADE,
    generationCreatedAt TEXT NOT NULL,
    generationModifiedAt TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_generations_family ON generations(familyId);

CREATE TABLE IF NOT EXISTS genotypes (
    genotypeId INTEGER PRIMARY KEY AUTOINCREMENT,
    genotypeName TEXT NOT NULL DEFAULT '',
    genotypeDescription TEXT NOT NULL DEFAULT '',
    generationId INTEGER REFERENCES generations(generationId) ON DELETE CASCADE,
    genotypeCreatedAt TEXT NOT NULL,
    genotypeModifiedAt TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_genotypes_generation ON genotypes(generationId);

-- ============================================================================
-- Growing environment: environments -> mediums
-- ============================================================================

CREATE TABLE IF NOT EXISTS environments (
    environmentId INTEGER PRIMARY KEY AUTOINCREMENT,
    environmentName TEXT NOT NULL,
    environmentDescription TEXT NOT NULL DEFAULT '',
    environmentCreatedAt TEXT NOT NULL,
    environmentModifiedAt TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mediums (
    mediumId INTEGER PRIMARY KEY AUTOINCREMENT,
    mediumName TEXT NOT NULL,
    mediumDescription TEXT NOT NULL DEFAULT '',
    environmentId INTEGER REFERENCES environments(environmentId) ON DELETE CASCADE,
    mediumCreatedAt TEXT NOT NULL,
    mediumModifiedAt TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_mediums_environment ON mediums(environmentId);

CREATE TABLE IF NOT EXISTS plants (
    plantId INTEGER PRIMARY KEY AUTOINCREMENT,
    plantName TEXT NOT NULL,
    plantSex TEXT CHECK (plantSex IN ('male', 'female', 'hermaphrodite')),
    plantDescription TEXT NOT NULL DEFAULT '',
    plantClonedFrom INTEGER REFERENCES plants(plantId) ON DELETE SET NULL,
    genotypeId INTEGER NOT NULL REFERENCES genotypes(genotypeId) ON DELETE CASCADE,
    mediumId INTEGER REFERENCES mediums(mediumId) ON DELETE SET NULL,
    plantCreatedAt TEXT NOT NULL,
    plantModifiedAt TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_plants_genotype ON plants(genotypeId);
CREATE INDEX IF NOT EXISTS idx_plants_cloned_from ON plants(plantClonedFrom);
CREATE INDEX IF NOT EXISTS idx_plants_medium ON plants(mediumId);

-- Parent plants of a generation; the set is replaced as a whole on update
CREATE TABLE IF NOT EXISTS generation_parents (
    generationId INTEGER NOT NULL REFERENCES generations(generationId) ON DELETE CASCADE,
    plantId INTEGER NOT NULL REFERENCES plants(plantId) ON DELETE CASCADE,
    PRIMARY KEY (generationId, plantId)
);

CREATE INDEX IF NOT EXISTS idx_generation_parents_plant ON generation_parents(plantId);

-- ============================================================================
-- Journals: one entry about exactly one plant, medium or environment
-- ============================================================================

-- journalValue has no declared type so stored values keep their storage class
CREATE TABLE IF NOT EXISTS journals (
    journalId INTEGER PRIMARY KEY AUTOINCREMENT,
    journalDatetime INTEGER NOT NULL,
    journalType TEXT NOT NULL,
    journalValue NOT NULL,
    plantId INTEGER REFERENCES plants(plantId) ON DELETE CASCADE,
    mediumId INTEGER REFERENCES mediums(mediumId) ON DELETE CASCADE,
    environmentId INTEGER REFERENCES environments(environmentId) ON DELETE CASCADE,
    journalCreatedAt TEXT NOT NULL,
    journalModifiedAt TEXT NOT NULL,
    CHECK ((plantId IS NOT NULL) + (mediumId IS NOT NULL) + (environmentId IS NOT NULL) = 1)
);

CREATE INDEX IF NOT EXISTS idx_journals_plant ON journals(plantId);
CREATE INDEX IF NOT EXISTS idx_journals_medium ON journals(mediumId);
CREATE INDEX IF NOT EXISTS idx_journals_environment ON journals(environmentId);
CREATE INDEX IF NOT EXISTS idx_journals_datetime ON journals(journalDatetime);
"#;
