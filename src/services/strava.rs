// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching and updating activities.
//!
//! Handles:
//! - Activity listing (bearer auth, paginated)
//! - Activity description updates
//! - Token refresh and authorization-code exchange
//!
//! Every call is a blocking round trip with a 10 second timeout. A 401/403
//! is surfaced as an authorization failure carrying the provider's message,
//! since it usually means a missing OAuth scope rather than a transport
//! problem.

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Activity, TokenPayload};

const STRAVA_TIMEOUT_SECS: u64 = 10;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(STRAVA_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            http,
            base_url: "https://www.strava.com/api/v3".to_string(),
            token_url: "https://www.strava.com/oauth/token".to_string(),
            client_id,
            client_secret,
        })
    }

    /// Point the client at a different API host (tests, relays).
    #[must_use]
    pub fn with_base_urls(mut self, base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.token_url = token_url.into();
        self
    }

    /// List the athlete's most recent activities.
    pub async fn list_activities(&self, access_token: &str, per_page: u32) -> Result<Vec<Activity>> {
        let url = format!("{}/athlete/activities", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("per_page", per_page.to_string())])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response, "请确认授权时包含 activity:read scope。")
            .await
    }

    /// Update an activity's description, returning the updated activity body.
    pub async fn update_activity_description(
        &self,
        access_token: &str,
        activity_id: &str,
        description: &str,
    ) -> Result<Value> {
        let url = format!("{}/activities/{}", self.base_url, activity_id);

        let body = serde_json::json!({
            "description": description
        });

        let response = self
            .http
            .put(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response, "确认 token 是否包含 activity:write scope。")
            .await
    }

    /// Refresh an expired access token.
    ///
    /// The refresh grant does not echo the athlete object; the token store
    /// carries the previous one forward.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPayload> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json(response, "refresh token 可能已失效，请重新授权。")
            .await
    }

    /// Exchange an authorization code for tokens (OAuth helper callback).
    pub async fn exchange_code(&self, code: &str) -> Result<TokenPayload> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token exchange failed: {}", e)))?;

        self.check_response_json(response, "授权码无效或已过期。").await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
        auth_hint: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = format_error_detail(&body);

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AppError::Authorization(format!("{}。{}", detail, auth_hint)));
            }

            return Err(AppError::StravaApi(format!("HTTP {}: {}", status, detail)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

/// Pull the provider's message (and field errors) out of an error body.
fn format_error_detail(body: &str) -> String {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            "<empty body>".to_string()
        } else {
            trimmed.to_string()
        };
    };

    let message = payload.get("message").and_then(Value::as_str);
    let errors = payload.get("errors").filter(|e| !e.is_null());
    match (message, errors) {
        (Some(message), Some(errors)) => format!("{} | errors={}", message, errors),
        (Some(message), None) => message.to_string(),
        _ => payload.to_string(),
    }
}
