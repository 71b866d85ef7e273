// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP routes for the local OAuth helper.

pub mod auth;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::StravaSettings;
use crate::services::{StravaClient, TokenStore};

/// Shared state for the helper server.
pub struct AuthState {
    pub settings: StravaSettings,
    pub strava: StravaClient,
    pub tokens: TokenStore,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Serve the helper until the process is terminated.
pub async fn serve(state: Arc<AuthState>, port: u16) -> crate::error::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("授权助手已启动，请在浏览器中打开 http://localhost:{}/login 完成 Strava 授权。", port);
    tracing::info!(address = %addr, "OAuth helper listening");

    let app = create_router(state);
    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!("Server error: {}", e)))?;
    Ok(())
}
