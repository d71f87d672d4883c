use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stats::StatsError;

/// Which survey collection a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    CheckIn,
    CheckOut,
}

impl RecordKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            RecordKind::CheckIn => "check_in_records",
            RecordKind::CheckOut => "check_out_records",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::CheckIn => "check-in",
            RecordKind::CheckOut => "check-out",
        }
    }
}

/// One observation of a person entering or leaving tracked areas.
///
/// Records are replaced wholesale on upsert, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub areas: Vec<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl AttendanceRecord {
    /// First and last name joined, skipping whichever part is missing
    pub fn person_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Project the record into the shape served inside date buckets
    pub fn to_bucketed(&self, tz: &Tz) -> BucketedRecord {
        BucketedRecord {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            time: format_minute(&self.recorded_at, tz),
            areas: self.areas.clone(),
            comments: self.comments.clone(),
            recorded_at: self.recorded_at,
        }
    }
}

/// Record as stored in a `DateBucketIndex` bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketedRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Local time in the reporting timezone, `YYYY-MM-DDTHH:mm`
    pub time: String,
    pub areas: Vec<String>,
    pub comments: Option<String>,
    #[serde(skip)]
    pub recorded_at: DateTime<Utc>,
}

pub const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub fn format_minute(instant: &DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format(MINUTE_FORMAT).to_string()
}

/// Parse a JSON document into records.
///
/// Anything other than a top-level array is a precondition failure rather
/// than something to coerce.
pub fn parse_records(value: Value) -> Result<Vec<AttendanceRecord>, StatsError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(StatsError::InvalidInput(format!(
                "expected an array of records, got {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| {
                StatsError::InvalidInput(format!("record {} is malformed: {}", index, e))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
