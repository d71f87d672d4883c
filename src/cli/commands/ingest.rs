use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::open_store;
use crate::stats::ReportOptions;
use crate::survey::{local_midnight, Granularity, Ingestor};

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(long, help = "Earliest response date to keep (YYYY-MM-DD), defaults to SURVEY_BACKFILL_SINCE")]
    pub since: Option<NaiveDate>,
}

pub async fn handle(args: IngestArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let options = ReportOptions::from_config(&config.reporting)?;
    let store = open_store(&config.database).await.context("failed to open the record store")?;

    let mut ingestor = Ingestor::from_config(&config.survey, store, options.timezone)?;
    let since = args.since.unwrap_or(config.survey.backfill_since);
    let report = ingestor
        .run_once(local_midnight(since, &options.timezone), Granularity::Day)
        .await
        .context("ingestion pass failed")?;

    output_success(
        &output_format,
        &format!(
            "Ingested responses since {}: {} check-ins, {} check-outs upserted",
            since, report.check_ins.upserted, report.check_outs.upserted
        ),
        Some(json!({ "since": since, "report": report })),
    )
}
