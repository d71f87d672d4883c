use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service name, version and endpoint list
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Occupancy Dashboard",
            "version": version,
            "description": "Building occupancy statistics from check-in and check-out surveys",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "POST /api/login (public - session acquisition)",
                "logout": "POST /api/logout (public)",
                "stats": "GET /api/stats (protected)",
                "summary": "GET /api/summary/:week (protected)",
                "fob": "POST /api/fob/query, POST /api/fob/update (protected)",
            }
        }
    }))
}

/// GET /health - 200 when the store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
