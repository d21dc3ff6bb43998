use std::{cell::RefCell, collections::HashSet, rc::Rc};

use crate::{
    deploy::local::db::LocalDatabase,
    query,
    record::IngestionRecord,
    sign::{InitError, Signer},
};

mod query_layer;

const DDL: &str = r#"
    CREATE TABLE alle_images_v2(
        alle_ingestion_id TEXT NOT NULL,
        alle_media_key TEXT NOT NULL,
        aspect_ratio REAL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE alle_image_attributes_v2(
        alle_ingestion_id TEXT NOT NULL,
        type TEXT NOT NULL,
        string_value TEXT,
        int_value INTEGER,
        float_value REAL,
        updated_at TEXT NOT NULL
    );
"#;

pub(crate) async fn source_db() -> LocalDatabase {
    let mut db = LocalDatabase::open("sqlite::memory:").await.unwrap();
    sqlx::query(DDL).execute(db.connection()).await.unwrap();
    db
}

pub(crate) async fn insert_image(
    db: &mut LocalDatabase,
    ingestion_id: &str,
    media_key: &str,
    aspect_ratio: Option<f64>,
    updated_at: &str,
) {
    sqlx::query(
        "INSERT INTO alle_images_v2(alle_ingestion_id, alle_media_key, aspect_ratio, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(ingestion_id)
    .bind(media_key)
    .bind(aspect_ratio)
    .bind(updated_at)
    .execute(db.connection())
    .await
    .unwrap();
}

pub(crate) enum Value<'a> {
    Int(i64),
    Float(f64),
    Text(&'a str),
}

pub(crate) async fn insert_attribute(
    db: &mut LocalDatabase,
    ingestion_id: &str,
    ty: &str,
    value: Value<'_>,
    updated_at: &str,
) {
    let (string_value, int_value, float_value) = match value {
        Value::Int(v) => (None, Some(v), None),
        Value::Float(v) => (None, None, Some(v)),
        Value::Text(v) => (Some(v), None, None),
    };
    sqlx::query(
        "INSERT INTO alle_image_attributes_v2(alle_ingestion_id, type, string_value, int_value, float_value, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(ingestion_id)
    .bind(ty)
    .bind(string_value)
    .bind(int_value)
    .bind(float_value)
    .bind(updated_at)
    .execute(db.connection())
    .await
    .unwrap();
}

/// Attributes of one seeded batch. `None` leaves the attribute row out.
#[derive(Clone)]
pub(crate) struct Seed<'a> {
    pub ingestion_query: Option<&'a str>,
    pub store_rank: Option<i64>,
    pub brisque_score: Option<f64>,
    pub syn_con_image_selection: Option<i64>,
    pub hero_category: Option<&'a str>,
    pub aspect_ratio: Option<f64>,
}

impl Default for Seed<'_> {
    fn default() -> Self {
        Self {
            ingestion_query: Some("blue denim jacket"),
            store_rank: Some(10),
            brisque_score: Some(5.0),
            syn_con_image_selection: Some(1),
            hero_category: None,
            aspect_ratio: Some(1.2),
        }
    }
}

pub(crate) async fn seed_batch(
    db: &mut LocalDatabase,
    ingestion_id: &str,
    media_key: &str,
    seed: &Seed<'_>,
) {
    let ts = "2025-08-29 10:00:00";
    insert_image(db, ingestion_id, media_key, seed.aspect_ratio, ts).await;
    if let Some(query) = seed.ingestion_query {
        insert_attribute(db, ingestion_id, "ingestion_query", Value::Text(query), ts).await;
    }
    if let Some(rank) = seed.store_rank {
        insert_attribute(db, ingestion_id, "store_rank", Value::Int(rank), ts).await;
    }
    if let Some(score) = seed.brisque_score {
        insert_attribute(db, ingestion_id, "brisque_score", Value::Float(score), ts).await;
    }
    if let Some(flag) = seed.syn_con_image_selection {
        insert_attribute(db, ingestion_id, "syn_con_image_selection", Value::Int(flag), ts).await;
    }
    if let Some(category) = seed.hero_category {
        insert_attribute(db, ingestion_id, "hero_category", Value::Text(category), ts).await;
    }
}

/// Signer double: URLs are derived from the object path; listed media keys
/// fail with an error or yield no URL.
#[derive(Default)]
pub(crate) struct FakeSigner {
    pub failing: HashSet<String>,
    pub missing: HashSet<String>,
    pub slow: HashSet<String>,
    pub init_fails: bool,
    pub calls: RefCell<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
#[error("signing refused for {0}")]
pub(crate) struct Refused(String);

pub(crate) fn signed_url(object_path: &str) -> String {
    format!("https://signed.test/{object_path}?sig=ok")
}

impl Signer for FakeSigner {
    type Client = ();
    type Error = Refused;

    async fn init_client(&self) -> Result<(), InitError> {
        if self.init_fails {
            Err(InitError::MissingBucket)
        } else {
            Ok(())
        }
    }

    async fn sign(&self, _: &(), object_path: &str) -> Result<Option<String>, Refused> {
        self.calls.borrow_mut().push(object_path.to_owned());
        let media_key = object_path.rsplit('/').next().unwrap_or_default();
        if self.slow.contains(media_key) {
            for _ in 0..16 {
                tokio::task::yield_now().await;
            }
        }
        if self.failing.contains(media_key) {
            Err(Refused(object_path.to_owned()))
        } else if self.missing.contains(media_key) {
            Ok(None)
        } else {
            Ok(Some(signed_url(object_path)))
        }
    }
}

/// Wraps a database and records whether it was closed.
pub(crate) struct TrackedDatabase {
    pub inner: LocalDatabase,
    pub closed: Rc<RefCell<bool>>,
}

impl query::Client for TrackedDatabase {
    async fn fetch_records(
        &mut self,
        statement: &str,
    ) -> Result<Vec<IngestionRecord>, sqlx::Error> {
        query::Client::fetch_records(&mut self.inner, statement).await
    }

    async fn close(self) {
        query::Client::close(self.inner).await;
        *self.closed.borrow_mut() = true;
    }
}

pub(crate) fn record(ingestion_id: &str, media_key: &str) -> IngestionRecord {
    IngestionRecord {
        ingestion_id: ingestion_id.to_owned(),
        media_key: media_key.to_owned(),
        ingestion_query: Some("blue denim jacket".to_owned()),
        store_rank: Some(10),
        brisque_score: Some(5.0),
        syn_con_image_selection: Some(1),
        hero_category: None,
        aspect_ratio: Some(1.2),
        eligible: crate::eligibility::Eligibility::Eligible,
    }
}
