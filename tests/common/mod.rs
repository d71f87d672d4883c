#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::SET_COOKIE;

use occupancy_dashboard::app::{app, AppState, RouterOptions};
use occupancy_dashboard::auth::{AuthError, Directory, JwtKeys};
use occupancy_dashboard::cases::{CaseStatsError, CaseStatsSource, RegionCaseStats};
use occupancy_dashboard::database::{DashboardStore, DatabaseError, FobData, MemoryStore};
use occupancy_dashboard::records::{AttendanceRecord, RecordKind};
use occupancy_dashboard::stats::ReportOptions;

pub const MEMBER_UID: &str = "jdoe";
pub const MEMBER_PASSWORD: &str = "correct horse";
pub const OUTSIDER_UID: &str = "visitor";
pub const OUTSIDER_PASSWORD: &str = "battery staple";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub jwt: Arc<JwtKeys>,
}

/// Directory with fixed passwords; only `members` pass the group check
pub struct StaticDirectory {
    passwords: HashMap<String, String>,
    members: Vec<String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self {
            passwords: [
                (MEMBER_UID.to_string(), MEMBER_PASSWORD.to_string()),
                (OUTSIDER_UID.to_string(), OUTSIDER_PASSWORD.to_string()),
            ]
            .into_iter()
            .collect(),
            members: vec![format!("uid={},ou=People,dc=landfood,dc=ubc,dc=ca", MEMBER_UID)],
        }
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn authenticate(&self, uid: &str, password: &str) -> Result<bool, AuthError> {
        if password.is_empty() || self.passwords.get(uid).map(String::as_str) != Some(password) {
            return Ok(false);
        }
        Ok(occupancy_dashboard::auth::is_group_member(&self.members, uid))
    }
}

/// Store whose every call fails, for outage paths
pub struct UnavailableStore;

#[async_trait]
impl DashboardStore for UnavailableStore {
    async fn fetch_records(&self, _kind: RecordKind) -> Result<Vec<AttendanceRecord>, DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }

    async fn upsert_record(&self, _kind: RecordKind, _record: &AttendanceRecord) -> Result<(), DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }

    async fn fetch_fob_data(&self, _week: &str) -> Result<Option<FobData>, DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }

    async fn upsert_fob_data(&self, _fob: &FobData) -> Result<(), DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }
}

/// Case source returning a fixed BC entry
pub struct StaticCases;

#[async_trait]
impl CaseStatsSource for StaticCases {
    async fn fetch_region(&self) -> Result<Option<RegionCaseStats>, CaseStatsError> {
        Ok(Some(RegionCaseStats {
            province: "BC".to_string(),
            date: Some("2021-02-01".to_string()),
            change_cases: Some(414),
            total_cases: Some(70616),
            other: Default::default(),
        }))
    }
}

/// Case source whose upstream is down
pub struct FailingCases;

#[async_trait]
impl CaseStatsSource for FailingCases {
    async fn fetch_region(&self) -> Result<Option<RegionCaseStats>, CaseStatsError> {
        Err(CaseStatsError::Api(503))
    }
}

/// Serve the router in-process on a free port, backed by `store`
pub async fn start_server_with(store: Arc<dyn DashboardStore>) -> Result<TestServer> {
    start_server_full(store, None).await
}

pub async fn start_server_full(
    store: Arc<dyn DashboardStore>,
    case_stats: Option<Arc<dyn CaseStatsSource>>,
) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);
    let jwt = Arc::new(JwtKeys::from_secret("integration-secret", "UBC LFS", Duration::minutes(60))?);

    let state = AppState {
        store,
        directory: Arc::new(StaticDirectory::new()),
        jwt: jwt.clone(),
        report: Arc::new(ReportOptions::default()),
        case_stats,
        secure_cookie: false,
    };
    let router = app(state, &RouterOptions::default());

    // Bound before spawning, so requests queue until the server accepts them
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind {}", base_url))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer { port, base_url, jwt })
}

pub async fn start_server() -> Result<TestServer> {
    start_server_with(Arc::new(MemoryStore::new())).await
}

/// Log in as the group member and return the `Cookie` header value to replay
pub async fn login_cookie(server: &TestServer) -> Result<String> {
    let res = reqwest::Client::new()
        .post(format!("{}/api/login", server.base_url))
        .json(&serde_json::json!({ "cwlId": MEMBER_UID, "password": MEMBER_PASSWORD }))
        .send()
        .await?;
    anyhow::ensure!(res.status().is_success(), "login failed: {}", res.status());

    let set_cookie = res
        .headers()
        .get(SET_COOKIE)
        .context("login response has no Set-Cookie")?
        .to_str()?;
    let pair = set_cookie.split(';').next().unwrap_or_default();
    Ok(pair.to_string())
}

pub fn record(id: &str, recorded_at: DateTime<Utc>, areas: &[&str]) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        first_name: Some("Sam".to_string()),
        last_name: Some("Rivera".to_string()),
        recorded_at,
        areas: areas.iter().map(|a| a.to_string()).collect(),
        comments: None,
    }
}
