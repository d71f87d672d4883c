use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

use crate::records::{AttendanceRecord, BucketedRecord};

type DayBuckets = BTreeMap<u32, Vec<BucketedRecord>>;
type MonthBuckets = BTreeMap<u32, DayBuckets>;

/// Records grouped by local year -> month (1-12) -> day of month.
///
/// Serializes as nested JSON objects keyed by the numbers as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DateBucketIndex(BTreeMap<i32, MonthBuckets>);

impl DateBucketIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket every record by its calendar date in `tz`
    pub fn build(records: &[AttendanceRecord], tz: &Tz) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert_record(record, tz);
        }
        index
    }

    /// Insert one record and return the local date it was filed under
    pub fn insert_record(&mut self, record: &AttendanceRecord, tz: &Tz) -> NaiveDate {
        let date = record.recorded_at.with_timezone(tz).date_naive();
        self.insert(date, record.to_bucketed(tz));
        date
    }

    pub fn insert(&mut self, date: NaiveDate, record: BucketedRecord) {
        self.0
            .entry(date.year())
            .or_default()
            .entry(date.month())
            .or_default()
            .entry(date.day())
            .or_default()
            .push(record);
    }

    /// Records for one date. A missing year, month or day is an empty bucket.
    pub fn day(&self, date: NaiveDate) -> &[BucketedRecord] {
        self.0
            .get(&date.year())
            .and_then(|months| months.get(&date.month()))
            .and_then(|days| days.get(&date.day()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every non-empty bucket in ascending date order
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[BucketedRecord])> + '_ {
        self.0.iter().flat_map(|(year, months)| {
            months.iter().flat_map(move |(month, days)| {
                days.iter().filter_map(move |(day, records)| {
                    NaiveDate::from_ymd_opt(*year, *month, *day).map(|date| (date, records.as_slice()))
                })
            })
        })
    }

    pub fn len(&self) -> usize {
        self.days().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn record(id: &str, at: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            first_name: Some("Sam".to_string()),
            last_name: Some("Ng".to_string()),
            recorded_at: at.parse::<DateTime<Utc>>().unwrap(),
            areas: vec!["MCML Level 1".to_string()],
            comments: None,
        }
    }

    #[test]
    fn buckets_by_local_calendar_day() {
        let tz = chrono_tz::America::Los_Angeles;
        // 2021-01-11T05:00Z is still Jan 10 in Los Angeles
        let index = DateBucketIndex::build(
            &[record("a", "2021-01-10T18:00:00Z"), record("b", "2021-01-11T05:00:00Z")],
            &tz,
        );
        let jan_10 = NaiveDate::from_ymd_opt(2021, 1, 10).unwrap();
        assert_eq!(index.day(jan_10).len(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn missing_bucket_is_empty_not_error() {
        let index = DateBucketIndex::new();
        let date = NaiveDate::from_ymd_opt(2030, 2, 28).unwrap();
        assert!(index.day(date).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn days_iterate_in_date_order() {
        let tz = chrono_tz::UTC;
        let index = DateBucketIndex::build(
            &[
                record("c", "2021-03-01T12:00:00Z"),
                record("a", "2020-12-31T12:00:00Z"),
                record("b", "2021-02-09T12:00:00Z"),
            ],
            &tz,
        );
        let dates: Vec<String> = index.days().map(|(d, _)| d.to_string()).collect();
        assert_eq!(dates, vec!["2020-12-31", "2021-02-09", "2021-03-01"]);
    }

    #[test]
    fn serializes_as_nested_numeric_keys() {
        let tz = chrono_tz::UTC;
        let index = DateBucketIndex::build(&[record("a", "2021-01-05T08:30:00Z")], &tz);
        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(value["2021"]["1"]["5"][0]["time"], "2021-01-05T08:30");
        assert_eq!(value["2021"]["1"]["5"][0]["firstName"], "Sam");
    }
}
