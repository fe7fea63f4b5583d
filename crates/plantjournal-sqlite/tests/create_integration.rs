//! Integration tests for generic create

mod common;

use common::{create_id, journal};
use plantjournal_sqlite::{Criteria, Entity, StoreError};
use serde_json::json;

#[tokio::test]
async fn test_create_family_round_trip() {
    let journal = journal();

    let created = journal
        .create(Entity::Family, json!({"familyName": "Haze"}))
        .await
        .unwrap();
    let id = created.id(Entity::Family).unwrap();
    let row = created.get(Entity::Family, id).unwrap();

    assert_eq!(row["familyName"], json!("Haze"));
    assert_eq!(row["familyDescription"], json!(""));
    assert_eq!(row["familyGenerations"], json!([]));
    assert_eq!(row["familyCreatedAt"], row["familyModifiedAt"]);

    let found = journal
        .find(Entity::Family, Criteria::filter(json!({"familyId": id})))
        .await
        .unwrap();
    assert_eq!(found.count, 1);
    assert_eq!(found.get(Entity::Family, id), Some(row));
}

#[tokio::test]
async fn test_create_plant_creates_ancestors() {
    let journal = journal();

    let created = journal
        .create(
            Entity::Plant,
            json!({
                "plantName": "Blue Dream #1",
                "plantSex": "female",
                "generationName": "F1",
                "familyName": "Blue Dream"
            }),
        )
        .await
        .unwrap();

    let family = created.id(Entity::Family).unwrap();
    let generation = created.id(Entity::Generation).unwrap();
    let genotype = created.id(Entity::Genotype).unwrap();
    let plant = created.id(Entity::Plant).unwrap();

    let generation_row = created.get(Entity::Generation, generation).unwrap();
    assert_eq!(generation_row["familyId"], json!(family));
    assert_eq!(generation_row["generationGenotypes"], json!([genotype]));

    let genotype_row = created.get(Entity::Genotype, genotype).unwrap();
    assert_eq!(genotype_row["generationId"], json!(generation));
    assert_eq!(genotype_row["genotypeName"], json!(""));
    assert_eq!(genotype_row["genotypePlants"], json!([plant]));

    let plant_row = created.get(Entity::Plant, plant).unwrap();
    assert_eq!(plant_row["genotypeId"], json!(genotype));
    assert_eq!(plant_row["plantSex"], json!("female"));
    assert_eq!(plant_row["mediumId"], json!(null));

    let found = journal
        .find(Entity::Plant, Criteria::filter(json!({"plantId": plant})))
        .await
        .unwrap();
    assert_eq!(found.get(Entity::Plant, plant), Some(plant_row));
    assert_eq!(found.get(Entity::Genotype, genotype), Some(genotype_row));
}

#[tokio::test]
async fn test_create_plant_without_generation_keeps_genotype_detached() {
    let journal = journal();

    let created = journal
        .create(Entity::Plant, json!({"plantName": "Seedling"}))
        .await
        .unwrap();

    assert!(created.rows(Entity::Generation).is_none());
    let genotype = created.id(Entity::Genotype).unwrap();
    assert_eq!(
        created.get(Entity::Genotype, genotype).unwrap()["generationId"],
        json!(null)
    );
}

#[tokio::test]
async fn test_create_with_existing_parent() {
    let journal = journal();
    let family = create_id(&journal, Entity::Family, json!({"familyName": "Kush"})).await;

    let created = journal
        .create(
            Entity::Generation,
            json!({"generationName": "S1", "familyId": family}),
        )
        .await
        .unwrap();

    assert!(created.rows(Entity::Family).is_none());
    let generation = created.id(Entity::Generation).unwrap();
    assert_eq!(
        created.get(Entity::Generation, generation).unwrap()["familyId"],
        json!(family)
    );
}

#[tokio::test]
async fn test_create_many_shares_ancestors() {
    let journal = journal();

    let created = journal
        .create_many(
            Entity::Plant,
            json!({"plantName": "Sibling", "generationName": "F2", "familyName": "Haze"}),
            3,
        )
        .await
        .unwrap();

    let plants = created.ids(Entity::Plant);
    assert_eq!(plants.len(), 3);
    assert_eq!(created.ids(Entity::Genotype).len(), 1);
    assert_eq!(created.ids(Entity::Family).len(), 1);

    let genotype = created.id(Entity::Genotype).unwrap();
    assert_eq!(
        created.get(Entity::Genotype, genotype).unwrap()["genotypePlants"],
        json!(plants)
    );
}

#[tokio::test]
async fn test_clone_inherits_genotype() {
    let journal = journal();
    let mother = journal
        .create(Entity::Plant, json!({"plantName": "Mother"}))
        .await
        .unwrap();
    let mother_id = mother.id(Entity::Plant).unwrap();
    let genotype = mother.id(Entity::Genotype).unwrap();

    let clone = journal
        .create(
            Entity::Plant,
            json!({"plantName": "Clone", "plantClonedFrom": mother_id}),
        )
        .await
        .unwrap();

    assert!(clone.rows(Entity::Genotype).is_none());
    let clone_id = clone.id(Entity::Plant).unwrap();
    let row = clone.get(Entity::Plant, clone_id).unwrap();
    assert_eq!(row["genotypeId"], json!(genotype));
    assert_eq!(row["plantClonedFrom"], json!(mother_id));

    let found = journal
        .find(Entity::Plant, Criteria::filter(json!({"plantId": mother_id})))
        .await
        .unwrap();
    assert_eq!(
        found.get(Entity::Plant, mother_id).unwrap()["plantClones"],
        json!([clone_id])
    );
}

#[tokio::test]
async fn test_clone_of_missing_plant_is_reference_error() {
    let journal = journal();

    let err = journal
        .create(
            Entity::Plant,
            json!({"plantName": "Orphan", "plantClonedFrom": 404}),
        )
        .await
        .unwrap_err();

    assert!(err.is_reference());
    assert!(err.to_string().contains("plantClonedFrom"));
}

#[tokio::test]
async fn test_invalid_reference_names_attribute() {
    let journal = journal();

    let err = journal
        .create(Entity::Plant, json!({"plantName": "Lost", "genotypeId": 999}))
        .await
        .unwrap_err();

    match err {
        StoreError::Reference { reference, target } => {
            assert_eq!(reference, "options.genotypeId");
            assert_eq!(target, "Genotype");
        }
        other => panic!("expected reference error, got {other:?}"),
    }

    // Nothing was written
    let found = journal.find(Entity::Plant, Criteria::new()).await.unwrap();
    assert_eq!(found.count, 0);
}

#[tokio::test]
async fn test_invalid_generation_parent_rolls_back() {
    let journal = journal();
    let family = create_id(&journal, Entity::Family, json!({"familyName": "Haze"})).await;

    let err = journal
        .create(
            Entity::Generation,
            json!({"generationName": "F1", "familyId": family, "generationParents": [77]}),
        )
        .await
        .unwrap_err();
    assert!(err.is_reference());
    assert!(err.to_string().contains("generationParents"));

    let found = journal
        .find(Entity::Generation, Criteria::new())
        .await
        .unwrap();
    assert_eq!(found.count, 0);
}

#[tokio::test]
async fn test_validation_errors_before_write() {
    let journal = journal();

    let cases = [
        (Entity::Family, json!({})),
        (Entity::Family, json!({"familyName": 3})),
        (Entity::Family, json!({"familyName": "x", "familyId": 1})),
        (Entity::Family, json!({"familyName": "x", "familyNickname": "y"})),
        (Entity::Plant, json!({"plantName": "x", "plantSex": "tree"})),
        (Entity::Generation, json!({"generationName": "x", "familyId": 1, "generationParents": "1"})),
        (Entity::Journal, json!({"journalDatetime": 1, "journalType": "log", "journalValue": 1})),
        (Entity::Family, json!(["not", "an", "object"])),
    ];

    for (entity, options) in cases {
        let err = journal.create(entity, options.clone()).await.unwrap_err();
        assert!(err.is_validation(), "{} {} -> {:?}", entity, options, err);
    }

    let found = journal.find(Entity::Family, Criteria::new()).await.unwrap();
    assert_eq!(found.count, 0);
}

#[tokio::test]
async fn test_create_many_rejects_zero() {
    let journal = journal();
    let err = journal
        .create_many(Entity::Family, json!({"familyName": "x"}), 0)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}
