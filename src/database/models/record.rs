use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::records::AttendanceRecord;

#[derive(Debug, Clone, FromRow)]
pub struct RecordRow {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub areas: Vec<String>,
    pub comments: Option<String>,
}

impl From<RecordRow> for AttendanceRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            recorded_at: row.recorded_at,
            areas: row.areas,
            comments: row.comments,
        }
    }
}
