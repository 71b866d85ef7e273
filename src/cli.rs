// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command-line interface: the critique pipeline and the OAuth helper.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{LlmSettings, StravaSettings};
use crate::error::Result;
use crate::routes::{self, AuthState};
use crate::services::{Critic, CritiqueGenerator, Pipeline, PipelineOptions, StravaClient, TokenStore};

#[derive(Parser)]
#[command(name = "strava-roast")]
#[command(about = "抓取最新 Strava 活动，生成毒舌点评，并可选择自动回写 description。", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 抓取 → 生成 → 上传 流水线
    Run(RunCommand),

    /// 启动本地 OAuth 授权助手
    Auth(AuthCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(cmd) => cmd.execute().await,
            Commands::Auth(cmd) => cmd.execute().await,
        }
    }
}

#[derive(Args)]
pub struct RunCommand {
    /// 调用活动 API 时请求的条数
    #[arg(long, default_value_t = 1)]
    per_page: u32,

    /// 活动 JSON 的存储路径
    #[arg(long, default_value = "latest_activities.json")]
    activities_file: PathBuf,

    /// 点评 JSON 的存储路径
    #[arg(long, default_value = "activity_critiques.json")]
    critiques_file: PathBuf,

    /// 指定 token 目录下的 token JSON，默认选择最新文件
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// token JSON 所在目录
    #[arg(long, default_value = "user_token")]
    token_dir: PathBuf,

    /// 点评提示词模板路径
    #[arg(long, default_value = "prompts/activity_prompt.md")]
    prompt_template: PathBuf,

    /// 覆盖 LLM 模型名称（默认读取 ONE_API_MODEL）
    #[arg(long)]
    model: Option<String>,

    /// 覆盖 LLM 接口地址（默认读取 ONE_API_REMOTE）
    #[arg(long)]
    base_url: Option<String>,

    /// 覆盖 LLM API Key（默认读取 ONE_API_KEY/OPENAI_API_KEY）
    #[arg(long)]
    api_key: Option<String>,

    /// 覆盖系统提示词（默认读取 LLM_SYSTEM_PROMPT）
    #[arg(long)]
    system_prompt: Option<String>,

    /// 本次最多上传多少条点评，默认不限制
    #[arg(long)]
    max_upload: Option<usize>,

    /// 仅展示将要写入的描述，不真正调用写接口
    #[arg(long)]
    dry_run: bool,

    /// 跳过抓取活动，直接使用 activities-file 中已有的数据
    #[arg(long)]
    skip_fetch: bool,

    /// 跳过生成点评，只执行上传阶段
    #[arg(long)]
    skip_generate: bool,

    /// 跳过上传描述，只抓取并生成点评
    #[arg(long)]
    skip_upload: bool,

    /// 强制重新生成并上传已标记为 uploaded 的点评
    #[arg(long)]
    regenerate_uploaded: bool,
}

impl RunCommand {
    pub async fn execute(self) -> Result<()> {
        let need_token = !self.skip_fetch || !self.skip_upload;

        // Generate-only runs never touch the Strava API, so missing OAuth
        // credentials are only fatal when a token is actually needed.
        let settings = match StravaSettings::from_env() {
            Ok(settings) => settings,
            Err(err) if need_token => return Err(err.into()),
            Err(_) => StravaSettings {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: String::new(),
            },
        };

        let strava = StravaClient::new(settings.client_id, settings.client_secret)?;
        let tokens = TokenStore::new(&self.token_dir);

        let critic: Option<Box<dyn Critic>> = if self.skip_generate {
            None
        } else {
            let llm = LlmSettings::resolve(
                self.api_key.clone(),
                self.model.clone(),
                self.base_url.clone(),
                self.system_prompt.clone(),
            )?;
            let template = CritiqueGenerator::load_template(&self.prompt_template)?;
            Some(Box::new(CritiqueGenerator::new(llm, template)?))
        };

        let options = PipelineOptions {
            per_page: self.per_page,
            token_file: self.token_file,
            activities_file: self.activities_file,
            critiques_file: self.critiques_file,
            max_upload: self.max_upload,
            dry_run: self.dry_run,
            skip_fetch: self.skip_fetch,
            skip_generate: self.skip_generate,
            skip_upload: self.skip_upload,
            regenerate_uploaded: self.regenerate_uploaded,
        };

        Pipeline::new(strava, tokens, critic, options).run().await
    }
}

#[derive(Args)]
pub struct AuthCommand {
    /// 授权助手监听端口
    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// token JSON 输出目录
    #[arg(long, default_value = "user_token")]
    token_dir: PathBuf,
}

impl AuthCommand {
    pub async fn execute(self) -> Result<()> {
        let settings = StravaSettings::from_env()?;
        let strava = StravaClient::new(settings.client_id.clone(), settings.client_secret.clone())?;
        let tokens = TokenStore::new(&self.token_dir);

        let state = Arc::new(AuthState {
            settings,
            strava,
            tokens,
        });
        routes::serve(state, self.port).await
    }
}
