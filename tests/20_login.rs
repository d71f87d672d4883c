mod common;

use anyhow::Result;
use reqwest::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn login(server: &common::TestServer, body: Value) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(format!("{}/api/login", server.base_url))
        .json(&body)
        .send()
        .await?)
}

#[tokio::test]
async fn member_login_sets_session_cookie() -> Result<()> {
    let server = common::start_server().await?;

    let res = login(&server, json!({ "cwlId": common::MEMBER_UID, "password": common::MEMBER_PASSWORD })).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res.headers().get(SET_COOKIE).expect("Set-Cookie").to_str()?.to_string();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=3600"));

    let token = cookie.trim_start_matches("access_token=").split(';').next().unwrap_or_default();
    let claims = server.jwt.validate(token)?;
    assert_eq!(claims.uid, common::MEMBER_UID);
    assert_eq!(claims.iss, "UBC LFS");

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["uid"], common::MEMBER_UID);
    Ok(())
}

#[tokio::test]
async fn rejected_logins_read_not_authenticated() -> Result<()> {
    let server = common::start_server().await?;

    let attempts = [
        json!({ "cwlId": common::MEMBER_UID, "password": "wrong" }),
        json!({ "cwlId": common::MEMBER_UID, "password": "" }),
        json!({ "cwlId": common::OUTSIDER_UID, "password": common::OUTSIDER_PASSWORD }),
        json!({}),
    ];

    for attempt in attempts {
        let res = login(&server, attempt.clone()).await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", attempt);
        assert!(res.headers().get(SET_COOKIE).is_none());

        let body: Value = res.json().await?;
        assert_eq!(body["message"], "Not Authenticated");
    }
    Ok(())
}

#[tokio::test]
async fn malformed_login_body_is_bad_request() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::Client::new()
        .post(format!("{}/api/login", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn logout_expires_cookie() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::Client::new()
        .post(format!("{}/api/logout", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res.headers().get(SET_COOKIE).expect("Set-Cookie").to_str()?;
    assert!(cookie.starts_with("access_token=;"));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_session() -> Result<()> {
    let server = common::start_server().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/stats", server.base_url);

    let res = client.get(&url).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(&url).header(COOKIE, "access_token=garbage").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let cookie = common::login_cookie(&server).await?;
    let res = client.get(&url).header(COOKIE, cookie.as_str()).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let token = cookie.trim_start_matches("access_token=");
    let res = client
        .get(&url)
        .header(COOKIE, format!("access_token=Bearer%20{}", token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(&url).header(AUTHORIZATION, format!("Bearer {}", token)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
