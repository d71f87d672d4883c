mod common;

use anyhow::Result;
use reqwest::header::COOKIE;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn post(server: &common::TestServer, cookie: &str, path: &str, body: Value) -> Result<(StatusCode, Value)> {
    let res = reqwest::Client::new()
        .post(format!("{}{}", server.base_url, path))
        .header(COOKIE, cookie)
        .json(&body)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

#[tokio::test]
async fn unknown_week_queries_as_null() -> Result<()> {
    let server = common::start_server().await?;
    let cookie = common::login_cookie(&server).await?;

    let (status, body) = post(&server, &cookie, "/api/fob/query", json!({ "week": "2021-01-10" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());
    Ok(())
}

#[tokio::test]
async fn update_then_query_round_trips() -> Result<()> {
    let server = common::start_server().await?;
    let cookie = common::login_cookie(&server).await?;

    // The upload dialog sends the pairs as a JSON string
    let new_data = json!([["Jan 11th, 2021", "14"], ["Jan 12th, 2021", "9"]]).to_string();
    let (status, body) = post(
        &server,
        &cookie,
        "/api/fob/update",
        json!({ "week": "2021-01-10", "newData": new_data }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"]["Jan 11th, 2021"], "14");

    let (_, body) = post(&server, &cookie, "/api/fob/query", json!({ "week": "2021-01-10" })).await?;
    assert_eq!(body["data"]["week"], "2021-01-10");
    assert_eq!(body["data"]["data"]["Jan 12th, 2021"], "9");

    // A second upload for the same week replaces the first
    post(&server, &cookie, "/api/fob/update", json!({ "week": "2021-01-10", "newData": {"Jan 13th, 2021": 3} })).await?;
    let (_, body) = post(&server, &cookie, "/api/fob/query", json!({ "week": "2021-01-10" })).await?;
    assert_eq!(body["data"]["data"], json!({"Jan 13th, 2021": "3"}));
    Ok(())
}

#[tokio::test]
async fn malformed_fob_updates_are_rejected() -> Result<()> {
    let server = common::start_server().await?;
    let cookie = common::login_cookie(&server).await?;

    let (status, _) = post(&server, &cookie, "/api/fob/update", json!({ "week": "2021-01-10", "newData": 7 })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&server, &cookie, "/api/fob/update", json!({ "week": " ", "newData": [] })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(&server, &cookie, "/api/fob/update", json!({ "week": "2021-01-10" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn fob_routes_need_a_session() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::Client::new()
        .post(format!("{}/api/fob/query", server.base_url))
        .json(&json!({ "week": "2021-01-10" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
