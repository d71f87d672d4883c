use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::buildings::{build_check_in_by_area, BuildingTally};
use super::index::DateBucketIndex;
use super::summary::{build_weekly_summary, WeeklySummary};
use super::ReportOptions;
use crate::records::{AttendanceRecord, BucketedRecord};

const LAST_WEEK_DAYS: i64 = 7;
const LAST_MONTH_DAYS: i64 = 31;

/// Everything the dashboard renders, computed from scratch per call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyReport {
    pub check_in_records: DateBucketIndex,
    pub check_out_records: DateBucketIndex,
    pub stats: DailyStats,
    pub summary: WeeklySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub num_check_in_today: usize,
    #[serde(rename = "numCheckInLast7Days")]
    pub num_check_in_last_7_days: usize,
    #[serde(rename = "numCheckInLast31Days")]
    pub num_check_in_last_31_days: usize,
    pub num_check_out_today: usize,
    pub check_in_by_time: BTreeMap<String, usize>,
    pub check_in_by_building: BuildingTally,
    pub check_in_by_area: BTreeMap<String, usize>,
    pub check_in_by_date: Vec<DateCount>,
    pub building_max_occupy: BTreeMap<String, Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Compute the dashboard report for `now`.
///
/// Pure and deterministic: identical records and `now` give identical output.
pub fn compute_stats(
    check_ins: &[AttendanceRecord],
    check_outs: &[AttendanceRecord],
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> OccupancyReport {
    let tz = &options.timezone;
    let today = now.with_timezone(tz).date_naive();
    let month_cutoff = today - Duration::days(LAST_MONTH_DAYS);
    let week_cutoff = today - Duration::days(LAST_WEEK_DAYS);

    let mut check_in_records = DateBucketIndex::new();
    let mut num_check_in_last_7_days = 0;
    let mut num_check_in_last_31_days = 0;
    for record in check_ins {
        let date = check_in_records.insert_record(record, tz);
        if date > month_cutoff {
            num_check_in_last_31_days += 1;
            if date > week_cutoff {
                num_check_in_last_7_days += 1;
            }
        }
    }

    let mut today_records = check_in_records.day(today).to_vec();
    sort_records_by_time(&mut today_records);

    let check_out_records = DateBucketIndex::build(check_outs, tz);
    let num_check_out_today = check_out_records.day(today).len();

    let stats = DailyStats {
        num_check_in_today: today_records.len(),
        num_check_in_last_7_days,
        num_check_in_last_31_days,
        num_check_out_today,
        check_in_by_time: build_check_in_by_time(&today_records),
        check_in_by_building: options.catalog.tally(&today_records),
        check_in_by_area: build_check_in_by_area(&today_records),
        check_in_by_date: build_check_in_by_date(&check_in_records),
        building_max_occupy: options.catalog.max_occupancy(),
    };

    let summary = build_weekly_summary(&check_in_records, options.week_start, &options.catalog);

    OccupancyReport {
        check_in_records,
        check_out_records,
        stats,
        summary,
    }
}

/// Ascending by instant; equal instants keep their relative order
pub fn sort_records_by_time(records: &mut [BucketedRecord]) {
    records.sort_by_key(|record| record.recorded_at);
}

/// Running count keyed by formatted minute.
///
/// Records sharing a minute collapse onto one key holding the latest rank.
pub fn build_check_in_by_time(sorted: &[BucketedRecord]) -> BTreeMap<String, usize> {
    let mut by_time = BTreeMap::new();
    for (rank, record) in sorted.iter().enumerate() {
        by_time.insert(record.time.clone(), rank + 1);
    }
    by_time
}

pub fn build_check_in_by_date(index: &DateBucketIndex) -> Vec<DateCount> {
    let mut by_date: Vec<DateCount> = index
        .days()
        .map(|(date, records)| DateCount {
            date,
            count: records.len(),
        })
        .collect();
    by_date.sort_by_key(|entry| entry.date);
    by_date
}
