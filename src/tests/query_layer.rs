use crate::{
    deploy::local::db::LocalDatabase,
    eligibility::{Eligibility, Rule},
    query::Client as _,
    record::IngestionRecord,
    sql::{self, Tables},
};

use super::{Seed, Value, insert_attribute, insert_image, seed_batch, source_db};

async fn fetch(db: &mut LocalDatabase) -> Vec<IngestionRecord> {
    let statement = sql::report(&Tables::default(), &Rule::default()).unwrap();
    db.fetch_records(&statement).await.unwrap()
}

#[tokio::test]
async fn scenario_row() {
    let mut db = source_db().await;
    seed_batch(&mut db, "ing1", "img1", &Seed::default()).await;
    let records = fetch(&mut db).await;
    assert_eq!(
        records,
        vec![IngestionRecord {
            ingestion_id: "ing1".into(),
            media_key: "img1".into(),
            ingestion_query: Some("blue denim jacket".into()),
            store_rank: Some(10),
            brisque_score: Some(5.0),
            syn_con_image_selection: Some(1),
            hero_category: None,
            aspect_ratio: Some(1.2),
            eligible: Eligibility::Eligible,
        }]
    );
}

#[tokio::test]
async fn latest_snapshot_wins() {
    let mut db = source_db().await;
    seed_batch(&mut db, "ing1", "img_old", &Seed::default()).await;
    insert_image(&mut db, "ing1", "img_new", Some(3.0), "2025-08-30 09:00:00").await;
    let records = fetch(&mut db).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].media_key, "img_new");
    assert_eq!(records[0].aspect_ratio, Some(3.0));
    assert_eq!(records[0].eligible, Eligibility::NotEligible);
}

#[tokio::test]
async fn tie_break_picks_smallest_media_key() {
    let mut db = source_db().await;
    seed_batch(&mut db, "ing1", "img_c", &Seed::default()).await;
    insert_image(&mut db, "ing1", "img_a", Some(1.0), "2025-08-29 10:00:00").await;
    insert_image(&mut db, "ing1", "img_b", Some(1.0), "2025-08-29 10:00:00").await;
    let records = fetch(&mut db).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].media_key, "img_a");
}

#[tokio::test]
async fn duplicate_attributes_resolve_to_max() {
    let mut db = source_db().await;
    seed_batch(&mut db, "ing1", "img1", &Seed::default()).await;
    insert_attribute(&mut db, "ing1", "store_rank", Value::Int(70), "2025-08-29 11:00:00").await;
    let records = fetch(&mut db).await;
    assert_eq!(records[0].store_rank, Some(70));
    assert_eq!(records[0].eligible, Eligibility::NotEligible);
}

#[tokio::test]
async fn batches_without_ingestion_query_are_skipped() {
    let mut db = source_db().await;
    seed_batch(&mut db, "ing1", "img1", &Seed::default()).await;
    let orphan = Seed {
        ingestion_query: None,
        ..Seed::default()
    };
    seed_batch(&mut db, "ing2", "img2", &orphan).await;
    let records = fetch(&mut db).await;
    let ids = records
        .iter()
        .map(|record| record.ingestion_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, ["ing1"]);
}

#[tokio::test]
async fn absent_attributes_are_null() {
    let mut db = source_db().await;
    let bare = Seed {
        store_rank: None,
        brisque_score: None,
        syn_con_image_selection: None,
        hero_category: None,
        ..Seed::default()
    };
    seed_batch(&mut db, "ing1", "img1", &bare).await;
    let records = fetch(&mut db).await;
    assert_eq!(records[0].store_rank, None);
    assert_eq!(records[0].brisque_score, None);
    assert_eq!(records[0].syn_con_image_selection, None);
    assert_eq!(records[0].hero_category, None);
    assert_eq!(records[0].eligible, Eligibility::NotEligible);
}

#[tokio::test]
async fn one_row_per_batch_ordered_by_id() {
    let mut db = source_db().await;
    for (id, media) in [("ing3", "c"), ("ing1", "a"), ("ing2", "b")] {
        seed_batch(&mut db, id, media, &Seed::default()).await;
    }
    let records = fetch(&mut db).await;
    let keys = records
        .iter()
        .map(|record| (record.ingestion_id.as_str(), record.media_key.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(keys, [("ing1", "a"), ("ing2", "b"), ("ing3", "c")]);
}

// The database and the in-process rule must classify every row the same way.
#[tokio::test]
async fn sql_rule_matches_in_process_rule() {
    let mut db = source_db().await;
    let variants = [
        Seed::default(),
        Seed {
            hero_category: Some("jeans"),
            ..Seed::default()
        },
        Seed {
            hero_category: Some("jackets"),
            ..Seed::default()
        },
        Seed {
            hero_category: Some("Jeans"),
            ..Seed::default()
        },
        Seed {
            hero_category: Some("JEANS"),
            ..Seed::default()
        },
        Seed {
            aspect_ratio: Some(3.0),
            ..Seed::default()
        },
        Seed {
            aspect_ratio: Some(0.5),
            ..Seed::default()
        },
        Seed {
            aspect_ratio: Some(2.0),
            ..Seed::default()
        },
        Seed {
            aspect_ratio: Some(2.01),
            ..Seed::default()
        },
        Seed {
            aspect_ratio: None,
            ..Seed::default()
        },
        Seed {
            store_rank: Some(50),
            brisque_score: Some(50.0),
            ..Seed::default()
        },
        Seed {
            store_rank: Some(51),
            ..Seed::default()
        },
        Seed {
            brisque_score: Some(50.5),
            ..Seed::default()
        },
        Seed {
            syn_con_image_selection: None,
            ..Seed::default()
        },
        Seed {
            syn_con_image_selection: Some(0),
            ..Seed::default()
        },
        Seed {
            store_rank: None,
            ..Seed::default()
        },
        Seed {
            brisque_score: None,
            ..Seed::default()
        },
    ];
    for (i, seed) in variants.iter().enumerate() {
        seed_batch(&mut db, &format!("ing{i:02}"), "img", seed).await;
    }
    let records = fetch(&mut db).await;
    assert_eq!(records.len(), variants.len());
    let rule = Rule::default();
    for record in &records {
        assert_eq!(record.eligible, rule.evaluate(&record.attributes()), "{record:?}");
    }
    let eligible = records.iter().filter(|r| r.eligible.is_eligible()).count();
    // default, jackets, 0.5, 2.0, and the inclusive rank/score bounds
    assert_eq!(eligible, 5);
}

#[test]
fn tables_are_qualified_with_schema() {
    let tables = Tables {
        schema: Some("image_ingestion".into()),
        ..Tables::default()
    };
    let statement = sql::report(&tables, &Rule::default()).unwrap();
    assert!(statement.contains("FROM image_ingestion.alle_image_attributes_v2 a"));
    assert!(statement.contains("JOIN image_ingestion.alle_images_v2 ai"));
}

#[test]
fn invalid_identifiers_are_rejected() {
    for tables in [
        Tables {
            images: "images; DROP TABLE x".into(),
            ..Tables::default()
        },
        Tables {
            schema: Some("".into()),
            ..Tables::default()
        },
        Tables {
            attributes: "attr-v2".into(),
            ..Tables::default()
        },
    ] {
        assert!(sql::report(&tables, &Rule::default()).is_err(), "{tables:?}");
    }
}
