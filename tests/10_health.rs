mod common;

use std::sync::Arc;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::get(format!("{}/", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Occupancy Dashboard");
    assert!(body["data"]["endpoints"]["stats"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_is_ok_with_memory_store() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn health_degrades_when_store_is_down() -> Result<()> {
    let server = common::start_server_with(Arc::new(common::UnavailableStore)).await?;

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
    Ok(())
}
