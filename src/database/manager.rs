use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the record store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS check_in_records (
        id          TEXT PRIMARY KEY,
        first_name  TEXT,
        last_name   TEXT,
        recorded_at TIMESTAMPTZ NOT NULL,
        areas       TEXT[] NOT NULL DEFAULT '{}',
        comments    TEXT,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS check_out_records (
        id          TEXT PRIMARY KEY,
        first_name  TEXT,
        last_name   TEXT,
        recorded_at TIMESTAMPTZ NOT NULL,
        areas       TEXT[] NOT NULL DEFAULT '{}',
        comments    TEXT,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fob_data (
        week       TEXT PRIMARY KEY,
        data       JSONB NOT NULL DEFAULT '{}'::jsonb,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Connection pool setup for the dashboard database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a bounded pool against `DATABASE_URL` and make sure the tables exist
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", Self::redact_url(url));

        Self::ensure_schema(&pool).await?;
        Ok(pool)
    }

    pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Connection string safe for logs: password masked, unparseable URLs hidden
    fn redact_url(raw: &str) -> String {
        match url::Url::parse(raw) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("****"));
                }
                url.into()
            }
            Err(_) => "<invalid database url>".to_string(),
        }
    }
}
