use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::auth::{Directory, JwtKeys};
use crate::cases::CaseStatsSource;
use crate::config::AppConfig;
use crate::database::DashboardStore;
use crate::handlers::{protected, public};
use crate::middleware::session_auth_middleware;
use crate::stats::ReportOptions;

/// Shared handler dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DashboardStore>,
    pub directory: Arc<dyn Directory>,
    pub jwt: Arc<JwtKeys>,
    pub report: Arc<ReportOptions>,
    /// Regional case counts for the stats page, when enabled
    pub case_stats: Option<Arc<dyn CaseStatsSource>>,
    pub secure_cookie: bool,
}

/// Router-level settings that are not per-request state
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub static_dir: Option<String>,
    pub cors_origins: Vec<String>,
}

impl RouterOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            static_dir: config.server.static_dir.clone(),
            cors_origins: config.security.cors_origins.clone(),
        }
    }
}

pub fn app(state: AppState, options: &RouterOptions) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/login", post(public::login))
        .route("/api/logout", post(public::logout))
        // Protected
        .merge(protected_routes(state.clone()));

    // Front-end build; unknown paths get index.html for client-side routing
    if let Some(dir) = options.static_dir.as_deref() {
        router = router.fallback_service(
            ServeDir::new(dir).not_found_service(ServeFile::new(Path::new(dir).join("index.html"))),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&options.cors_origins)),
        )
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(protected::stats_get))
        .route("/api/summary/:week", get(protected::summary_get))
        .route("/api/fob/query", post(protected::fob_query))
        .route("/api/fob/update", post(protected::fob_update))
        .route_layer(middleware::from_fn_with_state(state, session_auth_middleware))
}

/// Credentialed CORS for the listed origins; same-origin only when none are set
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if allowed.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
