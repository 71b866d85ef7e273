// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth helper route tests: login redirect, state verification, and the
//! callback exchange writing a token file.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use strava_roast::config::StravaSettings;
use strava_roast::routes::{create_router, AuthState};
use strava_roast::services::{StravaClient, TokenStore};

fn test_app(server: &MockServer, token_dir: &std::path::Path) -> axum::Router {
    let settings = StravaSettings {
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        redirect_uri: "http://localhost:5000/callback".to_string(),
    };
    let strava = StravaClient::new(settings.client_id.clone(), settings.client_secret.clone())
        .expect("client")
        .with_base_urls(
            format!("{}/api/v3", server.uri()),
            format!("{}/oauth/token", server.uri()),
        );
    let tokens = TokenStore::new(token_dir);

    create_router(Arc::new(AuthState {
        settings,
        strava,
        tokens,
    }))
}

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("request")
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(&server, dir.path());

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_redirects_to_strava_authorize() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(&server, dir.path());

    let response = get(&app, "/login").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("utf8");
    assert!(location.starts_with("https://www.strava.com/oauth/authorize?"));
    assert!(location.contains("client_id=test-client"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("scope=activity%3Aread_all%2Cactivity%3Awrite"));
    assert!(location.contains("state="));
}

#[tokio::test]
async fn test_login_honors_scope_override() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(&server, dir.path());

    let response = get(&app, "/login?scope=activity:read").await;
    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("utf8");
    assert!(location.contains("scope=activity%3Aread&"));
}

#[tokio::test]
async fn test_callback_exchanges_code_and_writes_token_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=test-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "fresh-access",
            "refresh_token": "fresh-refresh",
            "expires_at": 1790000000i64,
            "athlete": {"id": 7, "firstname": "测试", "lastname": "用户"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let token_dir = dir.path().join("user_token");
    let app = test_app(&server, &token_dir);

    // Start the flow to obtain a validly signed state.
    let login_response = get(&app, "/login").await;
    let location = login_response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("utf8");
    let state = location.split("state=").nth(1).expect("state param");

    let response = get(&app, &format!("/callback?code=test-code&state={}", state)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(payload["athlete"]["id"], 7);
    assert_eq!(payload["expires_at"], 1790000000i64);

    // The token file was written and is loadable.
    let token_file = std::path::PathBuf::from(payload["token_file"].as_str().expect("path"));
    let loaded = TokenStore::load(&token_file).expect("token file");
    assert_eq!(loaded.access_token, "fresh-access");
    assert_eq!(loaded.athlete.expect("athlete")["id"], 7);
}

#[tokio::test]
async fn test_callback_rejects_provider_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(&server, dir.path());

    let response = get(&app, "/callback?error=access_denied").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_rejects_tampered_state() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(&server, dir.path());

    let response = get(&app, "/callback?code=test-code&state=bm90LXZhbGlk").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_callback_requires_code() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(&server, dir.path());

    let response = get(&app, "/callback").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
