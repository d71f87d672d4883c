pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "occupancy")]
#[command(about = "Occupancy CLI - offline statistics and one-shot survey ingestion")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Compute the occupancy report from exported record files")]
    Stats(commands::stats::StatsArgs),

    #[command(about = "Run one survey ingestion pass against the configured store")]
    Ingest(commands::ingest::IngestArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Stats(args) => commands::stats::handle(args, output_format).await,
        Commands::Ingest(args) => commands::ingest::handle(args, output_format).await,
    }
}
