mod common;

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use occupancy_dashboard::database::MemoryStore;
use occupancy_dashboard::records::RecordKind;
use reqwest::header::COOKIE;
use reqwest::StatusCode;
use serde_json::Value;

async fn seeded_store() -> Arc<MemoryStore> {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    store
        .insert_all(
            RecordKind::CheckIn,
            vec![
                common::record("R_today_1", now, &["MCML Level 2"]),
                common::record("R_today_2", now, &["FNH Level 1"]),
                common::record("R_recent", now - Duration::days(3), &["UBC Farm"]),
                common::record("R_month", now - Duration::days(20), &["Totem Field"]),
                common::record("R_old", now - Duration::days(40), &["MCML Level 1"]),
            ],
        )
        .await;
    store
        .insert_all(RecordKind::CheckOut, vec![common::record("R_out", now, &["MCML Level 2"])])
        .await;
    store
}

async fn seeded_server() -> Result<common::TestServer> {
    common::start_server_with(seeded_store().await).await
}

async fn get_json(server: &common::TestServer, path: &str) -> Result<(StatusCode, Value)> {
    let cookie = common::login_cookie(server).await?;
    let res = reqwest::Client::new()
        .get(format!("{}{}", server.base_url, path))
        .header(COOKIE, cookie)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

#[tokio::test]
async fn stats_report_counts_windows_and_buildings() -> Result<()> {
    let server = seeded_server().await?;

    let (status, body) = get_json(&server, "/api/stats").await?;
    assert_eq!(status, StatusCode::OK);

    let stats = &body["data"]["stats"];
    assert_eq!(stats["numCheckInToday"], 2);
    assert_eq!(stats["numCheckInLast7Days"], 3);
    assert_eq!(stats["numCheckInLast31Days"], 4);
    assert_eq!(stats["numCheckOutToday"], 1);
    assert_eq!(stats["checkInByBuilding"]["MCML"], 1);
    assert_eq!(stats["checkInByBuilding"]["FNH"], 1);
    assert_eq!(stats["checkInByBuilding"]["UBC Farm"], 0);
    assert_eq!(stats["buildingMaxOccupy"]["MCML Level 1"], 57);

    let by_date = stats["checkInByDate"].as_array().expect("checkInByDate");
    let total: u64 = by_date.iter().filter_map(|d| d["count"].as_u64()).sum();
    assert_eq!(total, 5);

    assert!(body["data"]["checkInRecords"].is_object());
    assert!(body["data"]["summary"].is_object());
    assert!(stats["bcCovidStats"].is_null());
    Ok(())
}

#[tokio::test]
async fn stats_include_bc_case_counts() -> Result<()> {
    let server = common::start_server_full(seeded_store().await, Some(Arc::new(common::StaticCases))).await?;

    let (status, body) = get_json(&server, "/api/stats").await?;
    assert_eq!(status, StatusCode::OK);

    let cases = &body["data"]["stats"]["bcCovidStats"];
    assert_eq!(cases["province"], "BC");
    assert_eq!(cases["change_cases"], 414);
    assert_eq!(cases["total_cases"], 70616);
    assert_eq!(body["data"]["stats"]["numCheckInToday"], 2);
    Ok(())
}

#[tokio::test]
async fn case_outage_leaves_stats_intact() -> Result<()> {
    let server = common::start_server_full(seeded_store().await, Some(Arc::new(common::FailingCases))).await?;

    let (status, body) = get_json(&server, "/api/stats").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["stats"]["bcCovidStats"].is_null());
    assert_eq!(body["data"]["stats"]["numCheckInToday"], 2);
    Ok(())
}

#[tokio::test]
async fn stats_unavailable_when_store_fails() -> Result<()> {
    let server = common::start_server_with(Arc::new(common::UnavailableStore)).await?;

    let (status, body) = get_json(&server, "/api/stats").await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Statistics temporarily unavailable");
    Ok(())
}

#[tokio::test]
async fn weekly_summary_for_current_week() -> Result<()> {
    let server = seeded_server().await?;
    let today = Utc::now().with_timezone(&chrono_tz::America::Los_Angeles).date_naive();

    let (status, body) = get_json(&server, &format!("/api/summary/{}", today)).await?;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    let week_start = data["weekStart"].as_str().expect("weekStart").to_string();
    assert!(week_start <= today.to_string());
    assert_eq!(data["comparison"]["weekStart"], week_start.as_str());
    assert!(data["days"][today.to_string()]["count"].as_u64() >= Some(2));
    Ok(())
}

#[tokio::test]
async fn weekly_summary_rejects_bad_dates() -> Result<()> {
    let server = seeded_server().await?;

    let (status, body) = get_json(&server, "/api/summary/last-week").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}
