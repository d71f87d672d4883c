use clap::Parser;
use occupancy_dashboard::cli::{utils::output_error, Cli, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = occupancy_dashboard::cli::run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => output_error(&output_format, &format!("{e:?}"), None)?,
            _ => output_error(&output_format, &format!("{e:#}"), None)?,
        }
        std::process::exit(1);
    }

    Ok(())
}
