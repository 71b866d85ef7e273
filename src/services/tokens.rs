// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token store: OAuth token files under a local directory.
//!
//! File names carry a timestamp (`strava_token_20260806183000.json`) so the
//! lexicographically last file is the newest authorization. Refreshes rewrite
//! the file in place.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::TokenPayload;
use crate::services::StravaClient;

/// Margin before token expiration when we proactively refresh.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

const TOKEN_FILE_PREFIX: &str = "strava_token_";

/// Reads, refreshes and writes token files in one directory.
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The newest token file in the directory (lexicographic order).
    pub fn latest_file(&self) -> Result<PathBuf> {
        if !self.dir.exists() {
            return Err(AppError::Config(format!(
                "{} 目录不存在，请先运行 auth 子命令完成授权。",
                self.dir.display()
            )));
        }

        let mut candidates: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(TOKEN_FILE_PREFIX) && n.ends_with(".json"))
            })
            .collect();
        candidates.sort();

        candidates.pop().ok_or_else(|| {
            AppError::Config(format!(
                "{} 目录中未找到任何 token JSON 文件。",
                self.dir.display()
            ))
        })
    }

    /// Load a token payload from `path`.
    pub fn load(path: &Path) -> Result<TokenPayload> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                AppError::Config(format!("未找到 token 文件：{}", path.display()))
            } else {
                err.into()
            }
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("token 文件 {} 无法解析：{}", path.display(), e))
        })
    }

    /// Rewrite `path` with `payload`.
    pub fn save(path: &Path, payload: &TokenPayload) -> Result<()> {
        let json = serde_json::to_string_pretty(payload)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Token serialization failed: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Persist a freshly exchanged payload under a new timestamped name.
    pub fn write_new(&self, payload: &TokenPayload) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let path = self.dir.join(format!("{}{}.json", TOKEN_FILE_PREFIX, stamp));
        Self::save(&path, payload)?;
        Ok(path)
    }

    /// Return a valid access token, refreshing and rewriting the file first
    /// when `expires_at` is within the margin.
    ///
    /// `explicit` overrides the latest-file lookup.
    pub async fn ensure_access_token(
        &self,
        client: &StravaClient,
        explicit: Option<&Path>,
    ) -> Result<(String, PathBuf)> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => self.latest_file()?,
        };
        let payload = Self::load(&path)?;

        let now = chrono::Utc::now().timestamp();
        if !payload.expires_within(now, TOKEN_REFRESH_MARGIN_SECS) {
            return Ok((payload.access_token, path));
        }

        println!("access token 将过期，尝试刷新...");
        tracing::info!(path = %path.display(), "Access token expiring, refreshing");

        let mut refreshed = client.refresh_token(&payload.refresh_token).await?;
        // The refresh grant omits the athlete object; keep the one we had.
        if refreshed.athlete.is_none() {
            refreshed.athlete = payload.athlete;
        }
        Self::save(&path, &refreshed)?;

        println!("已刷新 access token。");
        Ok((refreshed.access_token, path))
    }
}
