use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::utils::output_value;
use crate::cli::OutputFormat;
use crate::config;
use crate::records::{parse_records, AttendanceRecord};
use crate::stats::{compute_stats, parse_timezone, OccupancyReport, ReportOptions};

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(long, help = "JSON array of check-in records")]
    pub check_ins: PathBuf,

    #[arg(long, help = "JSON array of check-out records")]
    pub check_outs: PathBuf,

    #[arg(long, help = "Report instant (RFC 3339), defaults to the current time")]
    pub now: Option<DateTime<Utc>>,

    #[arg(long, help = "Reporting timezone (IANA name), defaults to REPORTING_TIMEZONE")]
    pub timezone: Option<String>,
}

pub async fn handle(args: StatsArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut options = ReportOptions::from_config(&config::config().reporting)?;
    if let Some(name) = args.timezone.as_deref() {
        options.timezone = parse_timezone(name)?;
    }

    let check_ins = read_records(&args.check_ins)?;
    let check_outs = read_records(&args.check_outs)?;
    let now = args.now.unwrap_or_else(Utc::now);

    let report = compute_stats(&check_ins, &check_outs, now, &options);
    output_value(&output_format, &report, &digest(&report))
}

fn read_records(path: &Path) -> anyhow::Result<Vec<AttendanceRecord>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;
    parse_records(value).with_context(|| format!("{} does not hold attendance records", path.display()))
}

/// Short text rendering of a report
pub fn digest(report: &OccupancyReport) -> Vec<String> {
    let stats = &report.stats;
    let mut lines = vec![
        format!("Check-ins today:        {}", stats.num_check_in_today),
        format!("Check-ins last 7 days:  {}", stats.num_check_in_last_7_days),
        format!("Check-ins last 31 days: {}", stats.num_check_in_last_31_days),
        format!("Check-outs today:       {}", stats.num_check_out_today),
        "Today by building:".to_string(),
    ];

    lines.extend(
        stats
            .check_in_by_building
            .iter()
            .map(|(building, count)| format!("  {}: {}", building, count)),
    );
    lines.push(format!("Weeks on record: {}", report.summary.len()));
    lines
}
