// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Formatter functions exposed to the LLM as callable tools.
//!
//! The registry is a closed list: one tool per sport summary. Each tool takes
//! a single `activity_json` string argument so the model can pass the record
//! it was shown back in for metric extraction.

use serde_json::{json, Value};

use super::SportKind;

/// A formatter callable by the agent loop.
pub struct FormatterTool {
    pub name: &'static str,
    pub description: &'static str,
    kind: SportKind,
}

impl FormatterTool {
    /// JSON schema for the tool's arguments.
    pub fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "activity_json": {
                    "type": "string",
                    "description": "Strava 活动的完整 JSON 字符串",
                }
            },
            "required": ["activity_json"],
        })
    }

    /// Execute the tool against the arguments the model produced.
    pub fn invoke(&self, args: &Value) -> String {
        let raw = args
            .get("activity_json")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let activity = parse_activity_payload(raw);
        log_invocation(self.name, &activity);
        self.kind.summary(&activity)
    }
}

/// Parse the tool's JSON-string argument, wrapping unparseable input so the
/// summary still renders a placeholder block instead of failing.
pub fn parse_activity_payload(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        _ => json!({ "raw": raw }),
    }
}

fn log_invocation(tool_name: &str, activity: &Value) {
    let activity_id = activity
        .get("id")
        .map(Value::to_string)
        .unwrap_or_else(|| "unknown".to_string());
    let sport = activity
        .get("sport_type")
        .or_else(|| activity.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("未知类型");
    tracing::info!(tool = tool_name, activity_id = %activity_id, sport = %sport, "Formatter tool invoked");
}

/// The closed tool registry handed to the critique agent.
pub fn formatter_tools() -> Vec<FormatterTool> {
    vec![
        FormatterTool {
            name: "analyze_running_activity",
            description: "根据 Strava 活动 JSON 提供跑步指标，帮助你判断配速、心率、爬升情况。",
            kind: SportKind::Run,
        },
        FormatterTool {
            name: "analyze_cycling_activity",
            description: "根据 Strava 活动 JSON 提供骑行指标，关注速度、功率、踏频和爬升。",
            kind: SportKind::Ride,
        },
        FormatterTool {
            name: "analyze_swimming_activity",
            description: "根据 Strava 活动 JSON 提供游泳指标，关注配速、速度和心率。",
            kind: SportKind::Swim,
        },
        FormatterTool {
            name: "inspect_general_activity",
            description: "当运动类型未知或为通用健身追踪时，给出全面的指标摘要。",
            kind: SportKind::Generic,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_closed_set_of_four() {
        let tools = formatter_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "analyze_running_activity",
                "analyze_cycling_activity",
                "analyze_swimming_activity",
                "inspect_general_activity",
            ]
        );
    }

    #[test]
    fn test_invoke_parses_activity_json_argument() {
        let tools = formatter_tools();
        let run_tool = &tools[0];
        let args = json!({
            "activity_json": r#"{"name":"晨跑","sport_type":"Run","distance":5000,"moving_time":1500}"#
        });
        let output = run_tool.invoke(&args);
        assert!(output.contains("晨跑｜Run"));
        assert!(output.contains("5:00/公里"));
    }

    #[test]
    fn test_invoke_tolerates_garbage_argument() {
        let tools = formatter_tools();
        let output = tools[3].invoke(&json!({"activity_json": "not json at all"}));
        assert!(output.contains("未命名训练｜未知"));

        let output = tools[0].invoke(&json!({}));
        assert!(output.contains("未知距离"));
    }

    #[test]
    fn test_parameters_schema_shape() {
        let tools = formatter_tools();
        let schema = tools[0].parameters();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"][0], "activity_json");
    }
}
