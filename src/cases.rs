//! Regional case counts from the covid19tracker.ca summary API, shown beside
//! the occupancy figures. Failures never block the stats response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::CaseStatsConfig;

#[derive(Debug, Error)]
pub enum CaseStatsError {
    #[error("Case stats request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Case stats API returned {0}")]
    Api(u16),

    #[error("Invalid case stats API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// One province's entry from `/summary/split`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCaseStats {
    pub province: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub change_cases: Option<i64>,
    #[serde(default)]
    pub total_cases: Option<i64>,
    /// Remaining counters are passed through untouched
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SplitSummary {
    #[serde(default)]
    data: Vec<RegionCaseStats>,
}

#[async_trait]
pub trait CaseStatsSource: Send + Sync {
    /// Latest counts for the configured region; `Ok(None)` when the region is absent
    async fn fetch_region(&self) -> Result<Option<RegionCaseStats>, CaseStatsError>;
}

#[derive(Debug, Clone)]
pub struct CaseTrackerClient {
    http: reqwest::Client,
    summary_url: Url,
    province: String,
}

impl CaseTrackerClient {
    pub fn new(base_url: &str, province: impl Into<String>, timeout: Duration) -> Result<Self, CaseStatsError> {
        let summary_url = Url::parse(base_url)?.join("summary/split")?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            summary_url,
            province: province.into(),
        })
    }

    /// `None` when case stats are switched off
    pub fn from_config(config: &CaseStatsConfig) -> Result<Option<Self>, CaseStatsError> {
        if !config.enabled {
            return Ok(None);
        }
        Self::new(
            &config.api_base_url,
            config.province.as_str(),
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }
}

#[async_trait]
impl CaseStatsSource for CaseTrackerClient {
    async fn fetch_region(&self) -> Result<Option<RegionCaseStats>, CaseStatsError> {
        let res = self.http.get(self.summary_url.clone()).send().await?;
        if !res.status().is_success() {
            return Err(CaseStatsError::Api(res.status().as_u16()));
        }

        let summary: SplitSummary = res.json().await?;
        debug!("Case summary lists {} regions", summary.data.len());
        Ok(summary.data.into_iter().find(|region| region.province == self.province))
    }
}
