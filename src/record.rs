use sqlx::FromRow;

use crate::{
    eligibility::{Attributes, Eligibility},
    export::{Cell, Tabular},
};

/// One image of one ingestion batch, as returned by the report query.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct IngestionRecord {
    #[sqlx(rename = "alle_ingestion_id")]
    pub ingestion_id: String,
    #[sqlx(rename = "alle_media_key")]
    pub media_key: String,
    pub ingestion_query: Option<String>,
    pub store_rank: Option<i64>,
    pub brisque_score: Option<f64>,
    pub syn_con_image_selection: Option<i64>,
    pub hero_category: Option<String>,
    pub aspect_ratio: Option<f64>,
    #[sqlx(try_from = "String")]
    pub eligible: Eligibility,
}

impl IngestionRecord {
    pub fn attributes(&self) -> Attributes<'_> {
        Attributes {
            store_rank: self.store_rank,
            brisque_score: self.brisque_score,
            syn_con_image_selection: self.syn_con_image_selection,
            hero_category: self.hero_category.as_deref(),
            aspect_ratio: self.aspect_ratio,
        }
    }
}

/// A record together with its signed image URL.
///
/// `image_url` is empty when no URL could be generated.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: IngestionRecord,
    pub image_url: String,
}

impl Tabular for EnrichedRecord {
    const COLUMNS: &'static [&'static str] = &[
        "alle_ingestion_id",
        "alle_media_key",
        "ingestion_query",
        "store_rank",
        "syn_con_image_selection",
        "brisque_score",
        "hero_category",
        "aspect_ratio",
        "eligible",
        "image_url",
    ];

    fn cell(&self, column: &str) -> Option<Cell<'_>> {
        let record = &self.record;
        let cell = match column {
            "alle_ingestion_id" => Cell::Text(&record.ingestion_id),
            "alle_media_key" => Cell::Text(&record.media_key),
            "ingestion_query" => record.ingestion_query.as_deref().into(),
            "store_rank" => record.store_rank.into(),
            "syn_con_image_selection" => record.syn_con_image_selection.into(),
            "brisque_score" => record.brisque_score.into(),
            "hero_category" => record.hero_category.as_deref().into(),
            "aspect_ratio" => record.aspect_ratio.into(),
            "eligible" => Cell::Text(record.eligible.as_str()),
            "image_url" => Cell::Text(&self.image_url),
            _ => return None,
        };
        Some(cell)
    }
}
