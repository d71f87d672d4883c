use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::client::QualtricsClient;
use super::response::{normalize_response, SurveyFields};
use super::{SurveyError, SurveySource};
use crate::config::SurveyConfig;
use crate::database::DashboardStore;
use crate::records::{format_minute, RecordKind};

/// Resolution at which a response's recorded date is compared to `since`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Minute,
}

impl Granularity {
    /// `recorded` falls on or after `since` once both are truncated
    pub fn is_same_or_after(&self, recorded: DateTime<Utc>, since: DateTime<Utc>, tz: &Tz) -> bool {
        match self {
            Granularity::Day => {
                recorded.with_timezone(tz).date_naive() >= since.with_timezone(tz).date_naive()
            }
            Granularity::Minute => recorded.timestamp().div_euclid(60) >= since.timestamp().div_euclid(60),
        }
    }
}

/// Response counts seen on the previous pass, per survey kind.
///
/// A survey is only reprocessed when its export grows past the last count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionState {
    pub last_check_in_count: usize,
    pub last_check_out_count: usize,
}

impl IngestionState {
    pub fn last_count(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::CheckIn => self.last_check_in_count,
            RecordKind::CheckOut => self.last_check_out_count,
        }
    }

    fn set_last_count(&mut self, kind: RecordKind, count: usize) {
        match kind {
            RecordKind::CheckIn => self.last_check_in_count = count,
            RecordKind::CheckOut => self.last_check_out_count = count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyIngest {
    pub fetched: usize,
    pub upserted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// No new responses since the previous pass, nothing was written
    pub unchanged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub check_ins: SurveyIngest,
    pub check_outs: SurveyIngest,
}

impl IngestReport {
    fn slot(&mut self, kind: RecordKind) -> &mut SurveyIngest {
        match kind {
            RecordKind::CheckIn => &mut self.check_ins,
            RecordKind::CheckOut => &mut self.check_outs,
        }
    }
}

struct SurveyTarget {
    kind: RecordKind,
    survey_id: String,
    fields: SurveyFields,
}

/// Pulls survey exports into the store, owning its own `IngestionState`
pub struct Ingestor {
    source: Arc<dyn SurveySource>,
    store: Arc<dyn DashboardStore>,
    timezone: Tz,
    targets: Vec<SurveyTarget>,
    state: IngestionState,
}

impl Ingestor {
    pub fn new(source: Arc<dyn SurveySource>, store: Arc<dyn DashboardStore>, timezone: Tz) -> Self {
        Self {
            source,
            store,
            timezone,
            targets: Vec::new(),
            state: IngestionState::default(),
        }
    }

    /// Qualtrics-backed ingestor for whichever survey ids are configured
    pub fn from_config(
        config: &SurveyConfig,
        store: Arc<dyn DashboardStore>,
        timezone: Tz,
    ) -> Result<Self, SurveyError> {
        let client = QualtricsClient::from_config(config)?;
        let mut ingestor = Self::new(Arc::new(client), store, timezone);

        if let Some(id) = config.check_in_survey_id.as_deref() {
            ingestor = ingestor.with_survey(RecordKind::CheckIn, id);
        }
        if let Some(id) = config.check_out_survey_id.as_deref() {
            ingestor = ingestor.with_survey(RecordKind::CheckOut, id);
        }

        if ingestor.targets.is_empty() {
            return Err(SurveyError::NotConfigured("CHECKIN_SURVEY_ID or CHECKOUT_SURVEY_ID"));
        }
        Ok(ingestor)
    }

    pub fn with_survey(mut self, kind: RecordKind, survey_id: impl Into<String>) -> Self {
        self.targets.push(SurveyTarget {
            kind,
            survey_id: survey_id.into(),
            fields: SurveyFields::for_kind(kind),
        });
        self
    }

    pub fn state(&self) -> &IngestionState {
        &self.state
    }

    /// One ingestion pass.
    ///
    /// All exports are fetched before anything is written; a fetch failure
    /// aborts the pass without touching the store or the state. A survey's
    /// response count is only recorded once all of its writes succeed.
    pub async fn run_once(
        &mut self,
        since: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<IngestReport, SurveyError> {
        let mut exports: Vec<Vec<Value>> = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            exports.push(self.source.fetch_responses(&target.survey_id).await?);
        }

        let mut report = IngestReport::default();
        for (target, responses) in self.targets.iter().zip(exports) {
            let slot = report.slot(target.kind);
            slot.fetched = responses.len();

            if responses.len() <= self.state.last_count(target.kind) {
                slot.unchanged = true;
                debug!("No new {} responses ({} total)", target.kind.label(), responses.len());
                continue;
            }

            for response in &responses {
                let record = match normalize_response(response, &target.fields, &self.timezone) {
                    Ok(Some(record)) => record,
                    Ok(None) => {
                        slot.skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!("Skipping {} response: {}", target.kind.label(), e);
                        slot.skipped += 1;
                        continue;
                    }
                };

                if !granularity.is_same_or_after(record.recorded_at, since, &self.timezone) {
                    slot.skipped += 1;
                    continue;
                }

                match self.store.upsert_record(target.kind, &record).await {
                    Ok(()) => slot.upserted += 1,
                    Err(e) => {
                        error!("Failed to upsert {} record {}: {}", target.kind.label(), record.id, e);
                        slot.failed += 1;
                    }
                }
            }

            // Failed writes leave the count behind so the next pass retries them
            if slot.failed == 0 {
                self.state.set_last_count(target.kind, responses.len());
            } else {
                warn!(
                    "{} {} records failed to store, keeping previous response count",
                    slot.failed,
                    target.kind.label()
                );
            }
        }

        info!(
            "records updated {} (check-ins: {} upserted, check-outs: {} upserted)",
            format_minute(&Utc::now(), &self.timezone),
            report.check_ins.upserted,
            report.check_outs.upserted
        );

        Ok(report)
    }

    /// Backfill from `backfill_since`, then ingest the trailing `interval`
    /// every `interval` until the task is aborted.
    pub fn spawn_poller(mut self, backfill_since: NaiveDate, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let since = local_midnight(backfill_since, &self.timezone);
            if let Err(e) = self.run_once(since, Granularity::Day).await {
                error!("Initial survey backfill failed: {}", e);
            }

            let lookback = chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::minutes(10));
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; the backfill covered it
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once(Utc::now() - lookback, Granularity::Minute).await {
                    error!("Survey ingestion pass failed: {}", e);
                }
            }
        })
    }
}

/// Start of `date` in `tz`, as an instant
pub fn local_midnight(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}
