//! Survey ingestion: export responses from the survey platform, normalize
//! them into attendance records, and upsert them into the store.

pub mod client;
pub mod ingest;
pub mod response;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use client::QualtricsClient;
pub use ingest::{local_midnight, Granularity, IngestReport, IngestionState, Ingestor, SurveyIngest};
pub use response::{area_of_activity, normalize_response, SurveyFields};

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("Survey API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Survey API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid survey API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Response export failed: {0}")]
    ExportFailed(String),

    #[error("Response export did not complete after {attempts} progress checks")]
    ExportTimedOut { attempts: u32 },

    #[error("Malformed survey data: {0}")]
    Malformed(String),

    #[error("Missing configuration: {0}")]
    NotConfigured(&'static str),
}

/// Where raw survey responses come from
#[async_trait]
pub trait SurveySource: Send + Sync {
    /// Every response currently recorded for the survey, as exported JSON objects
    async fn fetch_responses(&self, survey_id: &str) -> Result<Vec<Value>, SurveyError>;
}
