//! Image URL enrichment
//!
//! Each record gets a signed URL for `<prefix>/<ingestion_id>/<media_key>`.
//! A failed signature never aborts the run: the record keeps an empty URL.

use futures::{StreamExt as _, stream};
use tracing::{info, warn};

use crate::{
    record::{EnrichedRecord, IngestionRecord},
    sign::{self, Signer},
};

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub object_prefix: String,
    /// Signing requests in flight. Output order always follows input order.
    pub concurrency: usize,
    /// Log progress every this many records.
    pub progress_interval: usize,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            object_prefix: "originals".to_owned(),
            concurrency: 1,
            progress_interval: 100,
        }
    }
}

#[derive(Debug)]
pub struct Enrichment {
    pub records: Vec<EnrichedRecord>,
    pub failures: usize,
}

async fn sign_record<S: Signer>(
    signer: &S,
    client: &S::Client,
    prefix: &str,
    record: &IngestionRecord,
) -> Option<String> {
    let object_path = sign::object_path(prefix, &record.ingestion_id, &record.media_key);
    match signer.sign(client, &object_path).await {
        Ok(Some(url)) => Some(url),
        Ok(None) => {
            warn!(media_key = %record.media_key, object_path, "no URL generated");
            None
        }
        Err(error) => {
            warn!(
                %error,
                media_key = %record.media_key,
                object_path,
                "failed to generate image URL"
            );
            None
        }
    }
}

pub async fn enrich<S: Signer>(
    signer: &S,
    client: &S::Client,
    records: Vec<IngestionRecord>,
    options: &EnrichOptions,
) -> Enrichment {
    let total = records.len();
    let interval = options.progress_interval.max(1);
    let prefix = options.object_prefix.as_str();
    info!(total, concurrency = options.concurrency, "adding image URLs to records");

    let mut signed = stream::iter(records)
        .map(move |record| async move {
            let url = sign_record(signer, client, prefix, &record).await;
            (record, url)
        })
        .buffered(options.concurrency.max(1));

    let mut enriched = Vec::with_capacity(total);
    let mut failures = 0;
    while let Some((record, url)) = signed.next().await {
        let image_url = url.unwrap_or_else(|| {
            failures += 1;
            String::new()
        });
        enriched.push(EnrichedRecord { record, image_url });
        if enriched.len() % interval == 0 {
            info!(
                processed = enriched.len(),
                total, "processed records for image URLs"
            );
        }
    }
    info!(total, failures, "added image URLs");
    Enrichment {
        records: enriched,
        failures,
    }
}
