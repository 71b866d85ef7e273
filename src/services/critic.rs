// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Critique generation: one prompt per activity, answered by an agent loop
//! that may call the formatter tools before producing final text.

use async_trait::async_trait;
use std::path::Path;

use crate::config::LlmSettings;
use crate::error::{AppError, Result};
use crate::formatters::{formatter_tools, FormatterTool};
use crate::llm::{ChatMessage, ChatRequest, FunctionDeclaration, OpenAiCompatibleClient, Tool};
use crate::models::Activity;

/// Upper bound on tool round trips before giving up on an activity.
const MAX_TOOL_ITERATIONS: usize = 8;

/// Seam for the pipeline: anything that can critique an activity.
#[async_trait]
pub trait Critic: Send + Sync {
    /// Produce non-empty critique text for one activity.
    async fn critique(&self, activity: &Activity) -> Result<String>;
}

/// LLM-backed critique generator with the formatter tools attached.
pub struct CritiqueGenerator {
    llm: OpenAiCompatibleClient,
    agent_prompt: String,
    template: String,
    tools: Vec<FormatterTool>,
}

impl CritiqueGenerator {
    pub fn new(settings: LlmSettings, template: String) -> Result<Self> {
        let agent_prompt = settings.agent_prompt.clone();
        let llm = OpenAiCompatibleClient::new(settings)?;
        Ok(Self {
            llm,
            agent_prompt,
            template,
            tools: formatter_tools(),
        })
    }

    /// Load the instruction template; a missing or empty file is a fatal
    /// configuration error, checked before any network call.
    pub fn load_template(path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                AppError::Config(format!("未找到点评提示词模板：{}", path.display()))
            } else {
                err.into()
            }
        })?;
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Config(format!(
                "提示词模板 {} 内容为空。",
                path.display()
            )));
        }
        Ok(content)
    }

    fn build_prompt(&self, activity: &Activity) -> String {
        let details = serde_json::to_string_pretty(&activity.to_value())
            .unwrap_or_else(|_| activity.to_value().to_string());
        format!("{}\n\n活动 JSON:\n{}", self.template, details)
    }

    fn tool_declarations(&self) -> Vec<Tool> {
        vec![Tool {
            function_declarations: self
                .tools
                .iter()
                .map(|tool| FunctionDeclaration {
                    name: tool.name.to_string(),
                    description: tool.description.to_string(),
                    parameters: tool.parameters(),
                })
                .collect(),
        }]
    }

    fn find_tool(&self, name: &str) -> Option<&FormatterTool> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}

#[async_trait]
impl Critic for CritiqueGenerator {
    async fn critique(&self, activity: &Activity) -> Result<String> {
        let mut messages = vec![
            ChatMessage::system(&self.agent_prompt),
            ChatMessage::user(self.build_prompt(activity)),
        ];
        let tools = self.tool_declarations();

        for iteration in 0..MAX_TOOL_ITERATIONS {
            let request = ChatRequest::new(messages.clone());
            let response = self.llm.complete_with_tools(&request, Some(&tools)).await?;

            if let Some(calls) = response
                .function_calls
                .as_ref()
                .filter(|calls| !calls.is_empty())
            {
                tracing::debug!(
                    activity_id = activity.id,
                    iteration,
                    tool_calls = calls.len(),
                    "Executing formatter tool calls"
                );

                if let Some(text) = response.content.as_deref().filter(|t| !t.is_empty()) {
                    messages.push(ChatMessage::assistant(text));
                }

                for call in calls {
                    let output = match self.find_tool(&call.name) {
                        Some(tool) => tool.invoke(&call.args),
                        None => format!("未知工具：{}", call.name),
                    };
                    messages.push(ChatMessage::user(format!(
                        "[工具 {} 返回]\n{}",
                        call.name, output
                    )));
                }
                continue;
            }

            let content = response.content.unwrap_or_default().trim().to_string();
            if content.is_empty() {
                return Err(AppError::Generation("模型返回了空点评。".to_string()));
            }
            return Ok(content);
        }

        Err(AppError::Generation(format!(
            "连续 {} 轮工具调用后仍未得到点评文本。",
            MAX_TOOL_ITERATIONS
        )))
    }
}
