use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{clear_cookie, session_cookie};
use crate::error::ApiError;
use crate::middleware::ApiResponse;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub cwl_id: String,
    pub password: String,
}

/// POST /api/login - authenticate against the directory and set the session cookie
///
/// Any failure short of a broken key setup reads as 401 "Not Authenticated".
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let uid = request.cwl_id.trim();

    if !state.directory.authenticate(uid, &request.password).await? {
        warn!("Login rejected for '{}'", uid);
        return Err(ApiError::unauthorized("Not Authenticated"));
    }

    let token = state.jwt.issue(uid, Utc::now())?;
    let lifetime = state.jwt.lifetime();
    info!("Session opened for {}", uid);

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, lifetime, state.secure_cookie))],
        ApiResponse::success(json!({
            "uid": uid,
            "expiresIn": lifetime.num_seconds()
        })),
    ))
}

/// POST /api/logout - expire the session cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_cookie(state.secure_cookie))],
        ApiResponse::success(json!({ "loggedOut": true })),
    )
}
