use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{SurveyError, SurveySource};
use crate::config::SurveyConfig;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportStarted {
    progress_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportProgress {
    status: Option<String>,
    file_id: Option<String>,
    percent_complete: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExportFile {
    #[serde(default)]
    responses: Vec<Value>,
}

/// Client for the Qualtrics v3 response-export API.
///
/// An export is started, polled until complete, then downloaded
/// uncompressed so no archive handling is needed.
#[derive(Debug, Clone)]
pub struct QualtricsClient {
    http: reqwest::Client,
    base_url: Url,
    api_token: String,
    poll_interval: Duration,
    max_attempts: u32,
}

impl QualtricsClient {
    pub fn new(base_url: &str, api_token: impl Into<String>) -> Result<Self, SurveyError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_token: api_token.into(),
            poll_interval: Duration::from_secs(1),
            max_attempts: 120,
        })
    }

    pub fn from_config(config: &SurveyConfig) -> Result<Self, SurveyError> {
        let token = config
            .api_token
            .as_deref()
            .ok_or(SurveyError::NotConfigured("QUALTRICS_API_TOKEN"))?;

        Ok(Self::new(&config.api_base_url, token)?.with_polling(
            Duration::from_millis(config.export_poll_interval_ms),
            config.export_max_attempts,
        ))
    }

    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn export_url(&self, survey_id: &str, suffix: &str) -> Result<Url, SurveyError> {
        let path = format!("API/v3/surveys/{}/export-responses{}", survey_id, suffix);
        Ok(self.base_url.join(&path)?)
    }

    async fn start_export(&self, survey_id: &str) -> Result<String, SurveyError> {
        let response = self
            .http
            .post(self.export_url(survey_id, "")?)
            .header("X-API-TOKEN", &self.api_token)
            .json(&json!({ "format": "json", "compress": false }))
            .send()
            .await?;

        let started: Envelope<ExportStarted> = read_json(response).await?;
        Ok(started.result.progress_id)
    }

    async fn export_progress(&self, survey_id: &str, progress_id: &str) -> Result<ExportProgress, SurveyError> {
        let response = self
            .http
            .get(self.export_url(survey_id, &format!("/{}", progress_id))?)
            .header("X-API-TOKEN", &self.api_token)
            .send()
            .await?;

        let progress: Envelope<ExportProgress> = read_json(response).await?;
        Ok(progress.result)
    }

    async fn wait_for_file(&self, survey_id: &str, progress_id: &str) -> Result<String, SurveyError> {
        for attempt in 1..=self.max_attempts {
            let progress = self.export_progress(survey_id, progress_id).await?;
            match progress.status.as_deref() {
                Some("complete") => {
                    return progress.file_id.ok_or_else(|| {
                        SurveyError::Malformed("completed export has no fileId".to_string())
                    })
                }
                Some("failed") => {
                    return Err(SurveyError::ExportFailed(format!("export {} failed", progress_id)))
                }
                None => {
                    return Err(SurveyError::ExportFailed(format!("export {} has no status", progress_id)))
                }
                Some(status) => {
                    debug!(
                        "Export {} for {} is {} ({:.0}%), attempt {}",
                        progress_id,
                        survey_id,
                        status,
                        progress.percent_complete.unwrap_or(0.0),
                        attempt
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(SurveyError::ExportTimedOut {
            attempts: self.max_attempts,
        })
    }

    async fn download_export(&self, survey_id: &str, file_id: &str) -> Result<Vec<Value>, SurveyError> {
        let response = self
            .http
            .get(self.export_url(survey_id, &format!("/{}/file", file_id))?)
            .header("X-API-TOKEN", &self.api_token)
            .send()
            .await?;

        let file: ExportFile = read_json(response).await?;
        Ok(file.responses)
    }
}

#[async_trait]
impl SurveySource for QualtricsClient {
    async fn fetch_responses(&self, survey_id: &str) -> Result<Vec<Value>, SurveyError> {
        let progress_id = self.start_export(survey_id).await?;
        let file_id = self.wait_for_file(survey_id, &progress_id).await?;
        let responses = self.download_export(survey_id, &file_id).await?;
        info!("Exported {} responses from survey {}", responses.len(), survey_id);
        Ok(responses)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SurveyError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(SurveyError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| SurveyError::Malformed(e.to_string()))
}
