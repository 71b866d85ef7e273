//! Application configuration loaded from environment variables and CLI flags.
//!
//! Everything is resolved once at startup into explicit structs that get
//! passed into the stage constructors; nothing reads the environment after
//! this module returns.

use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Default OpenAI-compatible endpoint when `ONE_API_REMOTE` is unset.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model when `ONE_API_MODEL` is unset.
pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";

/// Default redirect URI registered with the Strava application.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5000/callback";

/// Built-in agent system prompt, overridable via env or flag.
pub const DEFAULT_AGENT_PROMPT: &str = "你是运动锐评助理。请先阅读提供的 Strava 活动 JSON，辨别运动类型，\
必要时调用相应工具获取指标，再给出有趣又犀利的中文点评。点评里要引用工具返回的关键数据。";

/// Strava OAuth application settings.
///
/// Required whenever a token has to be refreshed or exchanged, i.e. for the
/// fetch/upload stages and for the local OAuth helper.
#[derive(Debug, Clone)]
pub struct StravaSettings {
    /// Strava OAuth client ID (public)
    pub client_id: String,
    /// Strava OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered with the Strava application
    pub redirect_uri: String,
}

impl StravaSettings {
    /// Load Strava credentials from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            client_id: env::var("STRAVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            redirect_uri: env::var("STRAVA_REDIRECT_URI")
                .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string()),
        })
    }
}

/// LLM endpoint settings for the critique generator.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// System prompt for the activity agent
    pub agent_prompt: String,
}

impl LlmSettings {
    /// Resolve LLM settings with flag-over-env precedence.
    ///
    /// Precedence per value: CLI flag, then `ONE_API_*`, then the OpenAI
    /// fallbacks, then the built-in default. A missing API key is fatal.
    pub fn resolve(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        agent_prompt: Option<String>,
    ) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_key = api_key
            .or_else(|| env::var("ONE_API_KEY").ok())
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            model: model
                .or_else(|| env::var("ONE_API_MODEL").ok())
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            base_url: base_url
                .or_else(|| env::var("ONE_API_REMOTE").ok())
                .or_else(|| env::var("OPENAI_BASE_URL").ok())
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            agent_prompt: agent_prompt
                .or_else(|| env::var("LLM_ACTIVITY_AGENT_PROMPT").ok())
                .or_else(|| env::var("LLM_SYSTEM_PROMPT").ok())
                .unwrap_or_else(|| DEFAULT_AGENT_PROMPT.to_string()),
        })
    }
}

/// File locations used by the pipeline, all overridable via flags.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Directory holding `strava_token_*.json` files
    pub token_dir: PathBuf,
    /// Activities JSON array written by the fetch stage
    pub activities_file: PathBuf,
    /// Critique store JSON object
    pub critiques_file: PathBuf,
    /// Critique instruction template (plain text, required non-empty)
    pub prompt_template: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            token_dir: PathBuf::from("user_token"),
            activities_file: PathBuf::from("latest_activities.json"),
            critiques_file: PathBuf::from("activity_critiques.json"),
            prompt_template: PathBuf::from("prompts/activity_prompt.md"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("缺少环境变量 {0}，请在 .env 中配置。")]
    Missing(&'static str),

    #[error("缺少 LLM API Key，请设置 ONE_API_KEY/OPENAI_API_KEY 或使用 --api-key。")]
    MissingApiKey,

    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_settings_flag_precedence() {
        let settings = LlmSettings::resolve(
            Some("key-from-flag".to_string()),
            Some("model-from-flag".to_string()),
            Some("http://flag.example/v1".to_string()),
            Some("prompt".to_string()),
        )
        .expect("settings should resolve");

        assert_eq!(settings.api_key, "key-from-flag");
        assert_eq!(settings.model, "model-from-flag");
        assert_eq!(settings.base_url, "http://flag.example/v1");
        assert_eq!(settings.agent_prompt, "prompt");
    }

    #[test]
    fn test_llm_settings_defaults() {
        for var in [
            "ONE_API_MODEL",
            "ONE_API_REMOTE",
            "OPENAI_BASE_URL",
            "LLM_ACTIVITY_AGENT_PROMPT",
            "LLM_SYSTEM_PROMPT",
        ] {
            env::remove_var(var);
        }
        let settings = LlmSettings::resolve(Some("key".to_string()), None, None, None)
            .expect("settings should resolve");

        assert_eq!(settings.model, DEFAULT_LLM_MODEL);
        assert_eq!(settings.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(settings.agent_prompt, DEFAULT_AGENT_PROMPT);
    }

    #[test]
    fn test_default_paths() {
        let paths = Paths::default();
        assert_eq!(paths.token_dir, PathBuf::from("user_token"));
        assert_eq!(paths.critiques_file, PathBuf::from("activity_critiques.json"));
    }
}
