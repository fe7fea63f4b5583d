//! Integration tests for filters on journal payloads

mod common;

use common::{create_id, journal};
use plantjournal_sqlite::{Criteria, Entity, PlantJournal};
use serde_json::{json, Value};

struct Fixture {
    journal: PlantJournal,
    feeding: i64,
    flag_bool: i64,
    flag_text: i64,
    note: i64,
}

async fn fixture() -> Fixture {
    let journal = journal();
    let plant = create_id(&journal, Entity::Plant, json!({"plantName": "Haze #1"})).await;

    let entry = |value: Value, kind: &'static str| {
        let journal = journal.clone();
        async move {
            create_id(
                &journal,
                Entity::Journal,
                json!({
                    "journalDatetime": 1_700_000_000,
                    "journalType": kind,
                    "journalValue": value,
                    "plantId": plant
                }),
            )
            .await
        }
    };

    let feeding = entry(
        json!({"amount": 1.5, "n": 3, "fertilizers": ["A", "B"]}),
        "feeding",
    )
    .await;
    let flag_bool = entry(json!({"flag": true}), "flag").await;
    let flag_text = entry(json!({"flag": "true"}), "flag").await;
    let note = entry(json!("looks healthy"), "note").await;

    Fixture {
        journal,
        feeding,
        flag_bool,
        flag_text,
        note,
    }
}

async fn matching(journal: &PlantJournal, filter: Value) -> Vec<i64> {
    journal
        .find(Entity::Journal, Criteria::filter(filter))
        .await
        .unwrap()
        .ids(Entity::Journal)
}

#[tokio::test]
async fn test_payload_decodes_on_read() {
    let f = fixture().await;
    let found = f
        .journal
        .find(Entity::Journal, Criteria::new())
        .await
        .unwrap();

    assert_eq!(
        found.get(Entity::Journal, f.feeding).unwrap()["journalValue"],
        json!({"amount": 1.5, "n": 3, "fertilizers": ["A", "B"]})
    );
    assert_eq!(
        found.get(Entity::Journal, f.flag_bool).unwrap()["journalValue"],
        json!({"flag": true})
    );
    assert_eq!(
        found.get(Entity::Journal, f.note).unwrap()["journalValue"],
        json!("looks healthy")
    );
}

#[tokio::test]
async fn test_dotted_path_comparisons() {
    let f = fixture().await;

    assert_eq!(
        matching(&f.journal, json!({"journalValue.amount": 1.5})).await,
        vec![f.feeding]
    );
    assert_eq!(
        matching(&f.journal, json!({"journalValue.amount": {"$gt": 1}})).await,
        vec![f.feeding]
    );
    assert!(matching(&f.journal, json!({"journalValue.amount": {"$lt": 1}}))
        .await
        .is_empty());
    assert_eq!(
        matching(&f.journal, json!({"journalValue.n": {"$in": [2, 3]}})).await,
        vec![f.feeding]
    );
    assert_eq!(
        matching(&f.journal, json!({"journalValue.fertilizers.1": "B"})).await,
        vec![f.feeding]
    );
}

#[tokio::test]
async fn test_booleans_and_strings_stay_distinct() {
    let f = fixture().await;

    assert_eq!(
        matching(&f.journal, json!({"journalValue.flag": true})).await,
        vec![f.flag_bool]
    );
    assert_eq!(
        matching(&f.journal, json!({"journalValue.flag": "true"})).await,
        vec![f.flag_text]
    );
}

#[tokio::test]
async fn test_contains() {
    let f = fixture().await;

    assert_eq!(
        matching(
            &f.journal,
            json!({"journalValue.fertilizers": {"$contains": "A"}})
        )
        .await,
        vec![f.feeding]
    );
    assert!(matching(
        &f.journal,
        json!({"journalValue.fertilizers": {"$contains": "C"}})
    )
    .await
    .is_empty());

    // Object values count as members too
    assert_eq!(
        matching(&f.journal, json!({"journalValue": {"$contains": true}})).await,
        vec![f.flag_bool]
    );
}

#[tokio::test]
async fn test_has_and_not_has() {
    let f = fixture().await;

    assert_eq!(
        matching(&f.journal, json!({"journalValue": {"$has": "n"}})).await,
        vec![f.feeding]
    );
    assert_eq!(
        matching(&f.journal, json!({"journalValue": {"$nhas": "n"}})).await,
        vec![f.flag_bool, f.flag_text, f.note]
    );
    assert_eq!(
        matching(
            &f.journal,
            json!({"journalValue": {"$has": "flag"}, "journalType": "flag"})
        )
        .await,
        vec![f.flag_bool, f.flag_text]
    );
}

#[tokio::test]
async fn test_invalid_json_filters() {
    let f = fixture().await;

    for filter in [
        json!({"journalValue.a..b": 1}),
        json!({"journalType.length": 1}),
        json!({"journalValue": {"$has": 3}}),
    ] {
        let err = f
            .journal
            .find(Entity::Journal, Criteria::filter(filter.clone()))
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{} -> {:?}", filter, err);
    }
}

/// Fresh store holding one journal entry per payload, ids in payload order
async fn store_with(payloads: Vec<Value>) -> (PlantJournal, Vec<i64>) {
    let journal = journal();
    let plant = create_id(&journal, Entity::Plant, json!({"plantName": "Haze #1"})).await;

    let mut ids = Vec::with_capacity(payloads.len());
    for value in payloads {
        ids.push(
            create_id(
                &journal,
                Entity::Journal,
                json!({
                    "journalDatetime": 1_700_000_000,
                    "journalType": "log",
                    "journalValue": value,
                    "plantId": plant
                }),
            )
            .await,
        );
    }
    (journal, ids)
}

#[tokio::test]
async fn test_root_booleans_and_strings_stay_distinct() {
    let (journal, ids) = store_with(vec![json!(true), json!("true"), json!(false)]).await;

    assert_eq!(
        matching(&journal, json!({"journalValue": true})).await,
        vec![ids[0]]
    );
    assert_eq!(
        matching(&journal, json!({"journalValue": "true"})).await,
        vec![ids[1]]
    );
    assert_eq!(
        matching(&journal, json!({"journalValue": {"$in": [true, false]}})).await,
        vec![ids[0], ids[2]]
    );
}

#[tokio::test]
async fn test_has_treats_operand_as_key() {
    let (journal, ids) = store_with(vec![
        json!({"1": "x", "a": 2}),
        json!(["first", "second"]),
        json!({"a.b": 1}),
    ])
    .await;

    assert_eq!(
        matching(&journal, json!({"journalValue": {"$has": "1"}})).await,
        vec![ids[0]]
    );
    assert_eq!(
        matching(&journal, json!({"journalValue": {"$has": "a"}})).await,
        vec![ids[0]]
    );
    assert_eq!(
        matching(&journal, json!({"journalValue": {"$has": "a.b"}})).await,
        vec![ids[2]]
    );
    assert_eq!(
        matching(&journal, json!({"journalValue": {"$nhas": "1"}})).await,
        vec![ids[1], ids[2]]
    );
}

#[tokio::test]
async fn test_out_of_range_number_text_matches() {
    let (journal, ids) = store_with(vec![json!({"x": "1e400"}), json!("1e400")]).await;

    assert_eq!(
        matching(&journal, json!({"journalValue.x": "1e400"})).await,
        vec![ids[0]]
    );
    assert_eq!(
        matching(&journal, json!({"journalValue": "1e400"})).await,
        vec![ids[1]]
    );

    let found = journal.find(Entity::Journal, Criteria::new()).await.unwrap();
    assert_eq!(
        found.get(Entity::Journal, ids[1]).unwrap()["journalValue"],
        json!("1e400")
    );
}
