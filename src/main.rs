use anyhow::{bail, Context};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use occupancy_dashboard::app::{app, AppState, RouterOptions};
use occupancy_dashboard::auth::{JwtKeys, LdapDirectory};
use occupancy_dashboard::cases::{CaseStatsSource, CaseTrackerClient};
use occupancy_dashboard::config::{self, AppConfig};
use occupancy_dashboard::database::{open_store, DashboardStore};
use occupancy_dashboard::is_production;
use occupancy_dashboard::stats::ReportOptions;
use occupancy_dashboard::survey::{Ingestor, SurveyError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, QUALTRICS_API_TOKEN, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    info!("Starting occupancy dashboard in {:?} mode", config.environment);

    if is_production!() && config.database.url.is_none() {
        bail!("DATABASE_URL is required in production");
    }

    let store = open_store(&config.database).await.context("failed to open the record store")?;
    let report = Arc::new(ReportOptions::from_config(&config.reporting)?);
    let jwt = Arc::new(JwtKeys::from_config(&config.security).context("failed to load JWT keys")?);

    let _poller = start_poller(config, store.clone(), &report);

    let case_stats = match CaseTrackerClient::from_config(&config.case_stats) {
        Ok(Some(client)) => Some(Arc::new(client) as Arc<dyn CaseStatsSource>),
        Ok(None) => None,
        Err(e) => {
            warn!("Case stats disabled: {}", e);
            None
        }
    };

    let state = AppState {
        store,
        directory: Arc::new(LdapDirectory::from_config(&config.ldap)),
        jwt,
        report,
        case_stats,
        secure_cookie: config.security.secure_cookie,
    };
    let router = app(state, &RouterOptions::from_config(config));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Occupancy dashboard listening on http://{}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}

/// Background survey ingestion, when the survey API is configured
fn start_poller(
    config: &AppConfig,
    store: Arc<dyn DashboardStore>,
    report: &ReportOptions,
) -> Option<tokio::task::JoinHandle<()>> {
    match Ingestor::from_config(&config.survey, store, report.timezone) {
        Ok(ingestor) => {
            let interval = Duration::from_secs(config.survey.poll_interval_minutes.max(1) * 60);
            info!(
                "Survey ingestion every {} minutes, backfilling from {}",
                config.survey.poll_interval_minutes, config.survey.backfill_since
            );
            Some(ingestor.spawn_poller(config.survey.backfill_since, interval))
        }
        Err(SurveyError::NotConfigured(name)) => {
            warn!("Survey ingestion disabled: {} not set", name);
            None
        }
        Err(e) => {
            warn!("Survey ingestion disabled: {}", e);
            None
        }
    }
}
