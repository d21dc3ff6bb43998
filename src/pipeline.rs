//! One report run: query → enrich → export.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use tracing::info;

use crate::{
    Error,
    eligibility::Rule,
    enrich::{self, EnrichOptions},
    export, query,
    sign::Signer,
    sql::{self, Tables},
};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub tables: Tables,
    pub rule: Rule,
    pub enrich: EnrichOptions,
    /// Output path; a timestamped name is derived from `started_at` if absent.
    pub output: Option<PathBuf>,
    pub started_at: DateTime<Local>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            tables: Tables::default(),
            rule: Rule::default(),
            enrich: EnrichOptions::default(),
            output: None,
            started_at: Local::now(),
        }
    }
}

impl ReportOptions {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(export::default_filename(&self.started_at)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub eligible: usize,
    pub signing_failures: usize,
    pub output: PathBuf,
}

impl Summary {
    pub fn not_eligible(&self) -> usize {
        self.total - self.eligible
    }

    /// Share of eligible records, in percent.
    pub fn eligibility_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.eligible as f64 / self.total as f64 * 100.0
        }
    }

    pub fn log(&self) {
        info!(
            total = self.total,
            eligible = self.eligible,
            not_eligible = self.not_eligible(),
            rate = %format!("{:.1}%", self.eligibility_rate()),
            signing_failures = self.signing_failures,
            output = %self.output.display(),
            "analysis complete"
        );
    }
}

async fn execute<D: query::Client, S: Signer>(
    db: &mut D,
    signer: &S,
    options: &ReportOptions,
) -> Result<Summary, Error> {
    let statement = sql::report(&options.tables, &options.rule).map_err(Error::Config)?;
    info!("executing report query");
    let records = db.fetch_records(&statement).await.map_err(Error::Query)?;
    info!(records = records.len(), "fetched records from database");

    let client = signer.init_client().await.map_err(Error::SignerInit)?;
    let enrichment = enrich::enrich(signer, &client, records, &options.enrich).await;

    let output = export::export(&options.output_path(), &enrichment.records)
        .map_err(Error::Export)?;
    let eligible = enrichment
        .records
        .iter()
        .filter(|enriched| enriched.record.eligible.is_eligible())
        .count();
    Ok(Summary {
        total: enrichment.records.len(),
        eligible,
        signing_failures: enrichment.failures,
        output,
    })
}

/// Run the report. `db` is closed before returning, whatever the outcome.
pub async fn run<D: query::Client, S: Signer>(
    mut db: D,
    signer: &S,
    options: &ReportOptions,
) -> Result<Summary, Error> {
    let result = execute(&mut db, signer, options).await;
    db.close().await;
    if let Ok(summary) = &result {
        summary.log();
    }
    result
}
