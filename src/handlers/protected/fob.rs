use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::app::AppState;
use crate::database::FobData;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};

#[derive(Debug, Deserialize)]
pub struct FobQuery {
    pub week: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FobUpdate {
    pub week: String,
    pub new_data: Value,
}

/// POST /api/fob/query - stored fob counts for a week, or `null`
pub async fn fob_query(
    State(state): State<AppState>,
    payload: Result<Json<FobQuery>, JsonRejection>,
) -> ApiResult<Option<FobData>> {
    let Json(query) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let fob = state.store.fetch_fob_data(query.week.trim()).await?;
    Ok(ApiResponse::success(fob))
}

/// POST /api/fob/update - replace the fob counts for a week
pub async fn fob_update(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    payload: Result<Json<FobUpdate>, JsonRejection>,
) -> ApiResult<FobData> {
    let Json(update) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let week = update.week.trim();
    if week.is_empty() {
        return Err(ApiError::bad_request("week is required"));
    }

    let fob = FobData {
        week: week.to_string(),
        data: parse_fob_entries(&update.new_data)?,
    };
    state.store.upsert_fob_data(&fob).await?;
    info!("Fob data for {} updated by {} ({} days)", fob.week, user.uid, fob.data.len());

    Ok(ApiResponse::success(fob))
}

/// Accepts `[[day, count], ...]`, `{day: count}`, or a JSON string holding
/// either. Counts may be strings or numbers.
pub fn parse_fob_entries(value: &Value) -> Result<BTreeMap<String, String>, ApiError> {
    match value {
        Value::String(raw) => {
            let inner: Value = serde_json::from_str(raw)
                .map_err(|e| ApiError::invalid_json(format!("newData is not valid JSON: {}", e)))?;
            if inner.is_string() {
                return Err(ApiError::bad_request("newData must be a list of pairs or an object"));
            }
            parse_fob_entries(&inner)
        }
        Value::Array(pairs) => pairs
            .iter()
            .map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([Value::String(day), count]) => Ok((day.clone(), count_text(count)?)),
                _ => Err(ApiError::bad_request("each newData entry must be a [day, count] pair")),
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(day, count)| Ok((day.clone(), count_text(count)?)))
            .collect(),
        _ => Err(ApiError::bad_request("newData must be a list of pairs or an object")),
    }
}

fn count_text(value: &Value) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ApiError::bad_request("fob counts must be strings or numbers")),
    }
}
