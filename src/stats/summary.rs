use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use super::buildings::{BuildingCatalog, BuildingTally};
use super::index::DateBucketIndex;

/// Week start date -> date within that week -> day summary
pub type WeeklySummary = BTreeMap<NaiveDate, BTreeMap<NaiveDate, DaySummary>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub count: usize,
    pub by_building: BuildingTally,
}

/// First day of the week containing `date`
pub fn week_start_of(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() as i64
        - week_start.num_days_from_monday() as i64)
        % 7;
    date - Duration::days(offset)
}

/// Group every bucketed day under its week, with a building tally of the
/// full day (not just today's records).
pub fn build_weekly_summary(
    index: &DateBucketIndex,
    week_start: Weekday,
    catalog: &BuildingCatalog,
) -> WeeklySummary {
    let mut summary = WeeklySummary::new();
    for (date, records) in index.days() {
        summary
            .entry(week_start_of(date, week_start))
            .or_default()
            .insert(
                date,
                DaySummary {
                    count: records.len(),
                    by_building: catalog.tally(records),
                },
            );
    }
    summary
}

/// Totals for a week compared against the week that started seven days earlier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekComparison {
    pub week_start: NaiveDate,
    pub previous_week_start: NaiveDate,
    pub total_this_week: usize,
    pub total_last_week: usize,
    pub average_this_week: f64,
    pub average_last_week: f64,
    /// `(this - last) / last`; absent when last week had no check-ins
    pub total_change: Option<f64>,
    pub average_change: Option<f64>,
}

pub fn week_over_week(summary: &WeeklySummary, week_start: NaiveDate) -> WeekComparison {
    let previous_week_start = week_start - Duration::days(7);
    let (total_this_week, average_this_week) = week_totals(summary.get(&week_start));
    let (total_last_week, average_last_week) = week_totals(summary.get(&previous_week_start));

    WeekComparison {
        week_start,
        previous_week_start,
        total_this_week,
        total_last_week,
        average_this_week,
        average_last_week,
        total_change: relative_change(total_this_week as f64, total_last_week as f64),
        average_change: relative_change(average_this_week, average_last_week),
    }
}

// Average is over the days that have records, not over seven.
fn week_totals(days: Option<&BTreeMap<NaiveDate, DaySummary>>) -> (usize, f64) {
    match days {
        Some(days) if !days.is_empty() => {
            let total: usize = days.values().map(|d| d.count).sum();
            (total, total as f64 / days.len() as f64)
        }
        _ => (0, 0.0),
    }
}

fn relative_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous)
    }
}
