// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pipeline orchestrator.
//!
//! Handles the core workflow:
//! 1. Fetch recent activities from Strava (token refreshed as needed)
//! 2. Generate a critique per activity, skipping uploaded ones
//! 3. Upload pending critiques as activity descriptions
//!
//! Each stage is independently skippable. Per-item failures in generate and
//! upload are logged and skipped so a batch makes partial progress; stage
//! and configuration failures abort the run.

use serde_json::Value;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::models::Activity;
use crate::services::{Critic, StravaClient, TokenStore};
use crate::store::{load_activities, save_activities, CritiqueStore};
use crate::time_utils::format_utc_rfc3339;

/// Per-run switches for the pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// How many activities to request from the list endpoint
    pub per_page: u32,
    /// Explicit token file; defaults to the newest in the token directory
    pub token_file: Option<PathBuf>,
    /// Activities JSON array path
    pub activities_file: PathBuf,
    /// Critique store path
    pub critiques_file: PathBuf,
    /// Cap on uploads per run
    pub max_upload: Option<usize>,
    /// Preview uploads without calling the API
    pub dry_run: bool,
    pub skip_fetch: bool,
    pub skip_generate: bool,
    pub skip_upload: bool,
    /// Regenerate critiques already marked uploaded
    pub regenerate_uploaded: bool,
}

/// Sequences Fetch → Generate → Upload over the flat-file stores.
pub struct Pipeline {
    strava: StravaClient,
    tokens: TokenStore,
    critic: Option<Box<dyn Critic>>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        strava: StravaClient,
        tokens: TokenStore,
        critic: Option<Box<dyn Critic>>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            strava,
            tokens,
            critic,
            options,
        }
    }

    /// Run the configured stages in order.
    pub async fn run(&self) -> Result<()> {
        let need_token = !self.options.skip_fetch || !self.options.skip_upload;
        let access_token = if need_token {
            let (token, path) = self
                .tokens
                .ensure_access_token(&self.strava, self.options.token_file.as_deref())
                .await?;
            println!("使用 token 文件：{}", path.display());
            Some(token)
        } else {
            None
        };

        let activities = if self.options.skip_fetch {
            let activities = load_activities(&self.options.activities_file)?;
            println!(
                "跳过抓取，使用 {} 中的 {} 条活动。",
                self.options.activities_file.display(),
                activities.len()
            );
            activities
        } else {
            let token = access_token
                .as_deref()
                .ok_or_else(|| AppError::Config("无法抓取活动：缺少 access token。".to_string()))?;
            self.fetch_stage(token).await?
        };

        let mut critiques = if self.options.skip_generate {
            let store = CritiqueStore::load(&self.options.critiques_file)?;
            println!(
                "跳过生成，直接从 {} 读取 {} 条点评。",
                self.options.critiques_file.display(),
                store.len()
            );
            store
        } else {
            self.generate_stage(&activities).await?
        };

        if self.options.skip_upload {
            println!("跳过上传，流程结束。");
            return Ok(());
        }

        let token = access_token
            .ok_or_else(|| AppError::Config("无法上传点评：缺少 access token。".to_string()))?;
        self.upload_stage(&mut critiques, &token).await?;
        Ok(())
    }

    /// Fetch stage: list recent activities and persist them.
    async fn fetch_stage(&self, access_token: &str) -> Result<Vec<Activity>> {
        let activities = self
            .strava
            .list_activities(access_token, self.options.per_page)
            .await?;
        save_activities(&self.options.activities_file, &activities)?;
        println!(
            "已抓取 {} 条活动，写入 {}。",
            activities.len(),
            self.options.activities_file.display()
        );
        Ok(activities)
    }

    /// Generate stage: critique each activity in fetch order.
    ///
    /// Entries already uploaded are skipped unless regeneration is forced; a
    /// single activity's failure never aborts the batch. The store is
    /// persisted once at the end of the stage.
    pub async fn generate_stage(&self, activities: &[Activity]) -> Result<CritiqueStore> {
        if activities.is_empty() {
            return Err(AppError::Generation(
                "活动列表为空，无法生成点评。".to_string(),
            ));
        }

        let mut store = CritiqueStore::load(&self.options.critiques_file)?;
        let total = activities.len();
        for (idx, activity) in activities.iter().enumerate() {
            let idx = idx + 1;
            let activity_id = activity.id_key();

            if store.get(&activity_id).is_some_and(|entry| entry.uploaded) {
                if !self.options.regenerate_uploaded {
                    println!("[{}/{}] 活动 {} 已上传点评，跳过生成。", idx, total, activity_id);
                    continue;
                }
                println!(
                    "[{}/{}] 活动 {} 已上传点评，因 --regenerate-uploaded 重新生成。",
                    idx, total, activity_id
                );
            }

            let critic = self
                .critic
                .as_deref()
                .ok_or_else(|| AppError::Config("未配置点评生成器。".to_string()))?;

            println!("[{}/{}] 正在生成活动 {} 的点评...", idx, total, activity_id);
            match critic.critique(activity).await {
                Ok(critique) => {
                    store.upsert(&activity_id, critique);
                    println!("[{}/{}] 已生成活动 {} 的点评。", idx, total, activity_id);
                }
                Err(err) => {
                    eprintln!("[失败] 活动 {} 点评生成失败：{}", activity_id, err);
                    tracing::warn!(activity_id = %activity_id, error = %err, "Critique generation failed");
                }
            }
        }

        store.save(&self.options.critiques_file)?;
        println!("点评已保存至 {}。", self.options.critiques_file.display());
        Ok(store)
    }

    /// Upload stage: write pending critiques back as descriptions.
    ///
    /// Each successful write flips the entry to uploaded and persists the
    /// whole store immediately, so a later failure loses nothing. A failed
    /// write leaves the entry pending and the loop continues.
    pub async fn upload_stage(
        &self,
        store: &mut CritiqueStore,
        access_token: &str,
    ) -> Result<usize> {
        let mut todo: Vec<(String, String)> = store
            .pending()
            .map(|(id, entry)| (id.clone(), entry.critique.clone()))
            .collect();
        if todo.is_empty() {
            println!("没有需要上传的点评。");
            return Ok(0);
        }
        if let Some(cap) = self.options.max_upload {
            todo.truncate(cap);
        }

        let mut processed = 0;
        for (activity_id, critique) in todo {
            if critique.trim().is_empty() {
                println!("[跳过] 活动 {} 缺少有效的 critique 字段。", activity_id);
                continue;
            }

            if self.options.dry_run {
                let preview: String = critique.replace('\n', " ").chars().take(60).collect();
                println!("[预览] 将把活动 {} 的描述更新为：{}...", activity_id, preview);
                continue;
            }

            match self
                .strava
                .update_activity_description(access_token, &activity_id, &critique)
                .await
            {
                Ok(result) => {
                    let updated = result
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| critique.clone());
                    store.mark_uploaded(
                        &activity_id,
                        updated,
                        format_utc_rfc3339(chrono::Utc::now()),
                    );
                    store.save(&self.options.critiques_file)?;
                    processed += 1;
                    println!("[成功] 已更新活动 {} 的描述。", activity_id);
                }
                Err(err) => {
                    eprintln!("[失败] 无法更新活动 {}：{}", activity_id, err);
                    tracing::warn!(activity_id = %activity_id, error = %err, "Description update failed");
                }
            }
        }

        if self.options.dry_run {
            println!("Dry run 完成，仅展示了准备更新的描述。");
        } else {
            println!("上传完成，共更新 {} 条活动描述。", processed);
        }
        Ok(processed)
    }
}
