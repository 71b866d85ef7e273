// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth authentication routes.
//!
//! `/login` redirects to Strava's authorize page with an HMAC-signed state;
//! `/callback` verifies the state, exchanges the code and writes a new
//! timestamp-named token file.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::routes::AuthState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

const AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";

const DEFAULT_SCOPE: &str = "activity:read_all,activity:write";

pub fn routes() -> Router<Arc<AuthState>> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
}

/// Query parameters for starting the OAuth flow.
#[derive(Deserialize)]
pub struct LoginParams {
    /// Requested scopes, comma separated.
    #[serde(default)]
    scope: Option<String>,
}

/// Start OAuth flow - redirect to Strava authorization.
async fn login(
    State(state): State<Arc<AuthState>>,
    Query(params): Query<LoginParams>,
) -> Result<Redirect> {
    let scope = params.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string());

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let oauth_state = sign_state(&scope, timestamp, state.settings.client_secret.as_bytes())?;

    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&approval_prompt=auto&scope={}&state={}",
        AUTHORIZE_URL,
        state.settings.client_id,
        urlencoding::encode(&state.settings.redirect_uri),
        urlencoding::encode(&scope),
        oauth_state
    );

    tracing::info!(
        client_id = %state.settings.client_id,
        scope = %scope,
        "Starting OAuth flow, redirecting to Strava"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Summary returned once the token file has been written.
#[derive(Serialize)]
pub struct CallbackResponse {
    pub message: String,
    pub token_file: String,
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub athlete: Option<Value>,
}

/// OAuth callback - exchange code for tokens, persist the token file.
async fn callback(
    State(state): State<Arc<AuthState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<CallbackResponse>> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return Err(AppError::Config(format!("Strava 授权失败：{}", error)));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::Config("缺少 authorization code。".to_string()))?;

    let oauth_state = params
        .state
        .ok_or_else(|| AppError::Authorization("缺少 state 参数。".to_string()))?;
    if verify_state(&oauth_state, state.settings.client_secret.as_bytes()).is_none() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return Err(AppError::Authorization(
            "state 校验失败，请重新发起授权。".to_string(),
        ));
    }

    tracing::info!("Exchanging authorization code for tokens");
    let payload = state.strava.exchange_code(&code).await?;
    let token_file = state.tokens.write_new(&payload)?;

    tracing::info!(
        token_file = %token_file.display(),
        expires_at = payload.expires_at,
        "OAuth successful, token file written"
    );
    println!("授权成功，token 已写入 {}。", token_file.display());

    Ok(Json(CallbackResponse {
        message: "授权成功".to_string(),
        token_file: token_file.display().to_string(),
        expires_at: payload.expires_at,
        athlete: payload.athlete,
    }))
}

/// Sign `scope|timestamp_hex` and base64-encode the result for the URL.
fn sign_state(scope: &str, timestamp: u128, secret: &[u8]) -> Result<String> {
    let state_payload = format!("{}|{:x}", scope, timestamp);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify the HMAC signature and return the scope the flow started with.
fn verify_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "scope|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let scope = parts[0];
    let timestamp_hex = parts[1];
    let signature_hex = parts[2];

    let payload = format!("{}|{}", scope, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected_signature {
        return None;
    }

    Some(scope.to_string())
}
