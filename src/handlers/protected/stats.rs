use axum::{extract::State, Extension};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::app::AppState;
use crate::cases::RegionCaseStats;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::records::RecordKind;
use crate::stats::{compute_stats, DailyStats, DateBucketIndex, OccupancyReport, WeeklySummary};

/// The occupancy report with the regional case counts folded into `stats`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub check_in_records: DateBucketIndex,
    pub check_out_records: DateBucketIndex,
    pub stats: StatsWithCases,
    pub summary: WeeklySummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsWithCases {
    #[serde(flatten)]
    pub daily: DailyStats,
    pub bc_covid_stats: Option<RegionCaseStats>,
}

impl StatsResponse {
    fn new(report: OccupancyReport, cases: Option<RegionCaseStats>) -> Self {
        Self {
            check_in_records: report.check_in_records,
            check_out_records: report.check_out_records,
            stats: StatsWithCases {
                daily: report.stats,
                bc_covid_stats: cases,
            },
            summary: report.summary,
        }
    }
}

/// GET /api/stats - the full occupancy report for the current instant
///
/// Both collections are fetched before aggregation starts; if either
/// fetch fails nothing is computed. Case counts are best effort.
pub async fn stats_get(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<StatsResponse> {
    let (records, cases) = futures::join!(
        async {
            futures::try_join!(
                state.store.fetch_records(RecordKind::CheckIn),
                state.store.fetch_records(RecordKind::CheckOut),
            )
        },
        region_cases(&state),
    );

    let (check_ins, check_outs) = records.map_err(|e| {
        error!("Failed to load records for statistics: {}", e);
        ApiError::service_unavailable("Statistics temporarily unavailable")
    })?;

    debug!(
        "Computing statistics for {} ({} check-ins, {} check-outs)",
        user.uid,
        check_ins.len(),
        check_outs.len()
    );

    let report = compute_stats(&check_ins, &check_outs, Utc::now(), &state.report);
    Ok(ApiResponse::success(StatsResponse::new(report, cases)))
}

async fn region_cases(state: &AppState) -> Option<RegionCaseStats> {
    let source = state.case_stats.as_ref()?;
    match source.fetch_region().await {
        Ok(cases) => cases,
        Err(e) => {
            warn!("Case stats unavailable: {}", e);
            None
        }
    }
}
