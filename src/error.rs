// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! User-visible messages are Chinese. Configuration and malformed-store
//! errors abort the run; generation/upload errors abort only the item they
//! belong to.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("配置错误：{0}")]
    Config(String),

    #[error("授权被拒绝：{0}")]
    Authorization(String),

    #[error("Strava API 错误：{0}")]
    StravaApi(String),

    #[error("点评生成失败：{0}")]
    Generation(String),

    #[error("上传描述失败：{0}")]
    Upload(String),

    #[error("存储文件损坏：{0}")]
    MalformedStore(String),

    #[error("IO 错误：{0}")]
    Io(#[from] std::io::Error),

    #[error("内部错误：{0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", Some(msg.clone())),
            AppError::Authorization(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", Some(msg.clone()))
            }
            AppError::StravaApi(msg) => {
                (StatusCode::BAD_GATEWAY, "strava_error", Some(msg.clone()))
            }
            AppError::Generation(msg) => (
                StatusCode::BAD_GATEWAY,
                "generation_error",
                Some(msg.clone()),
            ),
            AppError::Upload(msg) => (StatusCode::BAD_GATEWAY, "upload_error", Some(msg.clone())),
            AppError::MalformedStore(msg) => {
                tracing::error!(error = %msg, "Malformed store file");
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
            AppError::Io(err) => {
                tracing::error!(error = %err, "IO error");
                (StatusCode::INTERNAL_SERVER_ERROR, "io_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for the whole crate
pub type Result<T> = std::result::Result<T, AppError>;
