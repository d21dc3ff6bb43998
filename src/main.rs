use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use ingestion_report::{
    config::ReportConfig,
    deploy::{mysql, s3::S3Signer},
    eligibility::Rule,
    pipeline::{self, ReportOptions},
    viewer::{self, ViewerConfig},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version, about = "Eligible image report for ingestion batches")]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Query, classify and enrich ingestion records, then export them to CSV.
    Report(ReportConfig),
    /// Serve the working directory over local HTTP.
    Serve(ViewerConfig),
}

async fn report(config: ReportConfig) -> anyhow::Result<()> {
    let options = ReportOptions {
        tables: config.tables.into(),
        rule: Rule::default(),
        enrich: config.enrich.into(),
        output: config.output,
        started_at: Local::now(),
    };
    info!("starting image ingestion analysis");
    let db = mysql::Database::connect(&config.database)
        .await
        .map_err(ingestion_report::Error::Connect)?;
    let signer = S3Signer::new(config.storage);
    pipeline::run(db, &signer, &options).await?;
    Ok(())
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    match opts.command {
        Command::Report(config) => report(config).await,
        Command::Serve(config) => viewer::serve(&config)
            .await
            .with_context(|| format!("serve {}", config.root.display())),
    }
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(?e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(run(opts)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(?e, "critical error");
            ExitCode::FAILURE
        }
    }
}
