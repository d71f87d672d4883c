use axum::extract::{Path, State};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::records::RecordKind;
use crate::stats::summary::build_weekly_summary;
use crate::stats::{week_over_week, week_start_of, DateBucketIndex, DaySummary, WeekComparison};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummaryResponse {
    pub week_start: NaiveDate,
    pub days: BTreeMap<NaiveDate, DaySummary>,
    pub comparison: WeekComparison,
}

/// GET /api/summary/:week - one week of daily check-in summaries
///
/// `week` may be any date (YYYY-MM-DD) inside the week; it is snapped back
/// to the configured week start.
pub async fn summary_get(
    State(state): State<AppState>,
    Path(week): Path<String>,
) -> ApiResult<WeekSummaryResponse> {
    let date: NaiveDate = week
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid week '{}', expected YYYY-MM-DD", week)))?;

    let check_ins = state.store.fetch_records(RecordKind::CheckIn).await.map_err(|e| {
        error!("Failed to load check-ins for weekly summary: {}", e);
        ApiError::service_unavailable("Statistics temporarily unavailable")
    })?;

    let options = &state.report;
    let index = DateBucketIndex::build(&check_ins, &options.timezone);
    let summary = build_weekly_summary(&index, options.week_start, &options.catalog);

    let week_start = week_start_of(date, options.week_start);
    let comparison = week_over_week(&summary, week_start);
    let days = summary.get(&week_start).cloned().unwrap_or_default();

    Ok(ApiResponse::success(WeekSummaryResponse {
        week_start,
        days,
        comparison,
    }))
}
