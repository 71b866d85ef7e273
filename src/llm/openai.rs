// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenAI-compatible chat-completions client.
//!
//! Works against api.openai.com or any compatible relay (one-api, Ollama,
//! vLLM). Non-streaming; tool calls are surfaced to the caller, which runs
//! the loop.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{ChatMessage, ChatRequest, ChatResponseWithTools, FunctionCall, Tool};
use crate::config::LlmSettings;
use crate::error::{AppError, Result};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Completions can take a while on relayed or local backends.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// OpenAI-compatible API request structure.
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiToolCall {
    function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

/// Chat client over an OpenAI-compatible endpoint.
pub struct OpenAiCompatibleClient {
    client: Client,
    settings: LlmSettings,
}

impl OpenAiCompatibleClient {
    /// Create a client from resolved LLM settings.
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;
        Ok(Self { client, settings })
    }

    /// The configured default model.
    pub fn default_model(&self) -> &str {
        &self.settings.model
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn convert_tools(tools: &[Tool]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .flat_map(|tool| {
                tool.function_declarations.iter().map(|func| OpenAiTool {
                    tool_type: "function".to_owned(),
                    function: OpenAiFunction {
                        name: func.name.clone(),
                        description: func.description.clone(),
                        parameters: func.parameters.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_tool_calls(tool_calls: &[OpenAiToolCall]) -> Vec<FunctionCall> {
        tool_calls
            .iter()
            .map(|call| {
                let args: Value =
                    serde_json::from_str(&call.function.arguments).unwrap_or_default();
                FunctionCall {
                    name: call.function.name.clone(),
                    args,
                }
            })
            .collect()
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        AppError::Generation(format!("LLM 接口返回 {}：{}", status, detail))
    }

    /// Perform a chat completion, optionally offering tools.
    pub async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponseWithTools> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.settings.model.clone());
        let openai_tools = tools.map(Self::convert_tools);

        let openai_request = OpenAiRequest {
            model: model.clone(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tool_choice: openai_tools.as_ref().map(|_| "auto".to_owned()),
            tools: openai_tools,
        };

        tracing::debug!(
            model = %model,
            messages = request.messages.len(),
            has_tools = tools.is_some(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(&self.settings.api_key)
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AppError::Generation(format!(
                        "无法连接 LLM 接口 {}：{}",
                        self.settings.base_url, e
                    ))
                } else {
                    AppError::Generation(format!("LLM 请求失败：{}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Generation(format!("读取 LLM 响应失败：{}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::Generation(format!(
                "解析 LLM 响应失败：{}（body: {}）",
                e,
                body.chars().take(200).collect::<String>()
            ))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Generation("LLM 响应中没有 choices。".to_string()))?;

        let function_calls = choice
            .tool_calls()
            .map(|calls| Self::convert_tool_calls(calls));

        Ok(ChatResponseWithTools {
            content: choice.message.content,
            function_calls,
            model: openai_response.model.unwrap_or(model),
            finish_reason: choice.finish_reason,
        })
    }
}

impl OpenAiChoice {
    fn tool_calls(&self) -> Option<&[OpenAiToolCall]> {
        self.message
            .tool_calls
            .as_deref()
            .filter(|calls| !calls.is_empty())
    }
}
