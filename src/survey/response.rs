use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use super::SurveyError;
use crate::records::{AttendanceRecord, RecordKind};

/// Building choices that only open a follow-up question; never areas themselves
const PLACEHOLDER_BUILDINGS: [&str; 4] = ["FNH", "MCML", "Other", "Others"];

/// Question ids used by one survey's export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyFields {
    pub buildings: String,
    pub fnh_levels: String,
    pub mcml_levels: String,
    pub first_name: String,
    pub last_name: String,
    pub other_area: String,
    pub comments: String,
}

impl SurveyFields {
    pub fn check_in() -> Self {
        Self {
            buildings: "QID10".to_string(),
            fnh_levels: "QID13".to_string(),
            mcml_levels: "QID14".to_string(),
            first_name: "QID3_4".to_string(),
            last_name: "QID3_5".to_string(),
            other_area: "QID10_TEXT".to_string(),
            comments: "QID15_TEXT".to_string(),
        }
    }

    pub fn check_out() -> Self {
        Self {
            buildings: "QID14".to_string(),
            fnh_levels: "QID16".to_string(),
            mcml_levels: "QID13".to_string(),
            first_name: "QID3_4".to_string(),
            last_name: "QID3_5".to_string(),
            other_area: "QID14_6_TEXT".to_string(),
            comments: "QID15_TEXT".to_string(),
        }
    }

    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::CheckIn => Self::check_in(),
            RecordKind::CheckOut => Self::check_out(),
        }
    }
}

/// Expand the building answer and its follow-ups into area tags.
///
/// "FNH" and "MCML" are replaced by their selected levels ("FNH Level 1"),
/// "Other"/"Others" by the free-text answer.
pub fn area_of_activity(
    buildings: &[String],
    fnh_levels: &[String],
    mcml_levels: &[String],
    other_area: Option<&str>,
) -> Vec<String> {
    let mut areas: Vec<String> = buildings
        .iter()
        .filter(|building| !PLACEHOLDER_BUILDINGS.contains(&building.as_str()))
        .cloned()
        .collect();

    areas.extend(fnh_levels.iter().map(|level| format!("FNH {}", level)));
    areas.extend(mcml_levels.iter().map(|level| format!("MCML {}", level)));

    if let Some(other) = other_area {
        areas.push(other.to_string());
    }

    areas
}

/// Turn one exported response into a record.
///
/// Unfinished responses yield `Ok(None)`. A response without an id or a
/// readable recorded date is malformed; every other missing answer just
/// leaves the corresponding field empty.
pub fn normalize_response(
    response: &Value,
    fields: &SurveyFields,
    tz: &Tz,
) -> Result<Option<AttendanceRecord>, SurveyError> {
    let values = &response["values"];
    let labels = &response["labels"];

    if !is_truthy(&values["finished"]) {
        return Ok(None);
    }

    let id = text(&values["_recordId"])
        .or_else(|| text(&response["responseId"]))
        .ok_or_else(|| SurveyError::Malformed("response has no record id".to_string()))?;

    let raw_date = text(&values["recordedDate"])
        .ok_or_else(|| SurveyError::Malformed(format!("response {} has no recordedDate", id)))?;
    let recorded_at = parse_recorded_date(&raw_date, tz).ok_or_else(|| {
        SurveyError::Malformed(format!("response {} has unreadable recordedDate '{}'", id, raw_date))
    })?;

    let buildings = text_list(&labels[fields.buildings.as_str()]);
    let areas = if buildings.is_empty() {
        Vec::new()
    } else {
        area_of_activity(
            &buildings,
            &text_list(&labels[fields.fnh_levels.as_str()]),
            &text_list(&labels[fields.mcml_levels.as_str()]),
            text(&values[fields.other_area.as_str()]).as_deref(),
        )
    };

    Ok(Some(AttendanceRecord {
        id,
        first_name: text(&values[fields.first_name.as_str()]),
        last_name: text(&values[fields.last_name.as_str()]),
        recorded_at,
        areas,
        comments: text(&values[fields.comments.as_str()]),
    }))
}

/// RFC 3339 instants are taken as-is; offset-less timestamps are read in the
/// reporting timezone.
pub fn parse_recorded_date(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "True"),
        _ => false,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        other => text(other).into_iter().collect(),
    }
}
