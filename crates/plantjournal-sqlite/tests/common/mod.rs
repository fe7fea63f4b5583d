//! Shared setup for integration tests

#![allow(dead_code)]

use plantjournal_sqlite::{Entity, PlantJournal};
use serde_json::Value;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Fresh in-memory store
pub fn journal() -> PlantJournal {
    init_tracing();
    PlantJournal::memory().expect("Failed to open in-memory journal")
}

/// Create one row and return the id of the requested entity
pub async fn create_id(journal: &PlantJournal, entity: Entity, options: Value) -> i64 {
    journal
        .create(entity, options)
        .await
        .expect("create failed")
        .id(entity)
        .expect("no id returned")
}
