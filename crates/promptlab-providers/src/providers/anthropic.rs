// ABOUTME: Anthropic adapter for the Messages API (POST /v1/messages).
// ABOUTME: Forces structured output through a single synthetic tool and reads it back from tool_use blocks.

use serde_json::{Value, json};

use promptlab_core::model::{GenerationConfig, Message, Provider, Usage};
use promptlab_core::{PlaygroundError, StructuredOutput};

use crate::providers::{ProviderAdapter, token_count};
use crate::response::{ParsedResponse, structured_text, structured_value};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicAdapter;

impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn default_base_url(&self) -> &'static str {
        DEFAULT_BASE_URL
    }

    fn endpoint(&self, base_url: &str) -> String {
        format!("{}/v1/messages", base_url)
    }

    fn auth_header_name(&self) -> &'static str {
        "x-api-key"
    }

    fn auth_header_value(&self, api_key: &str) -> String {
        api_key.to_string()
    }

    fn static_headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![("anthropic-version", API_VERSION)]
    }

    /// The Messages API rejects an empty message list, so a blank template
    /// with no messages is a validation error rather than an empty user turn.
    fn resolve_messages(
        &self,
        rendered_template: &str,
        messages: Option<&[Message]>,
    ) -> Result<Vec<Message>, PlaygroundError> {
        match messages {
            Some(msgs) if !msgs.is_empty() => Ok(msgs.to_vec()),
            _ if !rendered_template.is_empty() => Ok(vec![Message::user(rendered_template)]),
            _ => Err(PlaygroundError::Validation(
                "At least one message is required for Anthropic".to_string(),
            )),
        }
    }

    /// `temperature` and `top_p` are mutually exclusive here: `top_p` is sent
    /// only when the caller set it and left `temperature` unset.
    fn build_body(
        &self,
        model: &str,
        messages: &[Message],
        config: &GenerationConfig,
        structured: Option<&StructuredOutput>,
    ) -> Value {
        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": config.max_tokens()
        });

        match (config.temperature, config.top_p) {
            (None, Some(top_p)) => body["top_p"] = json!(top_p),
            _ => body["temperature"] = json!(config.temperature()),
        }

        if let Some(structured) = structured {
            body["tools"] = json!([{
                "name": structured.name,
                "description": structured.tool_description(),
                "input_schema": structured.schema
            }]);
            body["tool_choice"] = json!({
                "type": "tool",
                "name": structured.name
            });
        }

        body
    }

    fn parse_response(
        &self,
        body: &Value,
        structured: Option<&StructuredOutput>,
    ) -> Result<ParsedResponse, PlaygroundError> {
        let blocks = body
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| PlaygroundError::UnexpectedResponseType {
                provider: Provider::Anthropic.to_string(),
                detail: "missing content array in response".to_string(),
            })?;

        let tool_input = structured.and_then(|s| {
            blocks
                .iter()
                .find(|b| block_type(b) == Some("tool_use"))
                .and_then(|b| b.get("input"))
                .map(|input| (s, input.clone()))
        });

        let content = if let Some((s, input)) = tool_input {
            structured_value(input, s)
        } else if let Some(text) = blocks
            .iter()
            .find(|b| block_type(b) == Some("text"))
            .and_then(|b| b.get("text"))
            .and_then(|t| t.as_str())
        {
            structured_text(text, structured)
        } else {
            return Err(PlaygroundError::UnexpectedResponseType {
                provider: Provider::Anthropic.to_string(),
                detail: "no text or tool_use content block".to_string(),
            });
        };

        Ok(ParsedResponse {
            id: body.get("id").and_then(|v| v.as_str()).map(String::from),
            content,
            usage: parse_usage(body),
            model: body.get("model").and_then(|v| v.as_str()).map(String::from),
        })
    }
}

fn block_type(block: &Value) -> Option<&str> {
    block.get("type").and_then(|t| t.as_str())
}

/// Anthropic reports no total; it is the sum of input and output tokens.
fn parse_usage(body: &Value) -> Option<Usage> {
    let usage = body.get("usage").filter(|u| u.is_object())?;
    let prompt_tokens = token_count(usage, "input_tokens").unwrap_or(0);
    let completion_tokens = token_count(usage, "output_tokens").unwrap_or(0);

    Some(Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens.saturating_add(completion_tokens),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels_output() -> StructuredOutput {
        StructuredOutput::from_schema(json!({
            "title": "Labels",
            "description": "Label each line",
            "type": "array",
            "items": { "type": "string" }
        }))
    }

    #[test]
    fn endpoint_appends_messages_path() {
        assert_eq!(
            AnthropicAdapter.endpoint(DEFAULT_BASE_URL),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(
            AnthropicAdapter.endpoint("https://proxy.local"),
            "https://proxy.local/v1/messages"
        );
    }

    #[test]
    fn anthropic_rejects_empty_message_list() {
        let err = AnthropicAdapter.resolve_messages("", Some(&[][..])).unwrap_err();
        assert!(matches!(err, PlaygroundError::Validation(_)));

        let err = AnthropicAdapter.resolve_messages("", None).unwrap_err();
        assert!(err.to_string().contains("At least one message"));
    }

    #[test]
    fn anthropic_synthesizes_message_from_template() {
        let messages = AnthropicAdapter.resolve_messages("Hi", None).unwrap();
        assert_eq!(messages, vec![Message::user("Hi")]);
    }

    #[test]
    fn anthropic_builds_request_body() {
        let body = AnthropicAdapter.build_body(
            "claude-3-5-haiku-20241022",
            &[Message::user("Hello")],
            &GenerationConfig::default(),
            None,
        );

        assert_eq!(body["model"], "claude-3-5-haiku-20241022");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["temperature"], 0.7);
        assert!(body.get("top_p").is_none());
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn anthropic_sends_top_p_only_without_temperature() {
        let only_top_p = GenerationConfig {
            top_p: Some(0.9),
            ..Default::default()
        };
        let body = AnthropicAdapter.build_body("m", &[Message::user("x")], &only_top_p, None);
        assert_eq!(body["top_p"], 0.9);
        assert!(body.get("temperature").is_none());

        let both = GenerationConfig {
            temperature: Some(0.3),
            top_p: Some(0.9),
            max_tokens: Some(64),
        };
        let body = AnthropicAdapter.build_body("m", &[Message::user("x")], &both, None);
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["max_tokens"], 64);
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn anthropic_forces_structured_tool() {
        let structured = labels_output();
        let body = AnthropicAdapter.build_body(
            "m",
            &[Message::user("x")],
            &GenerationConfig::default(),
            Some(&structured),
        );

        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "labels");
        assert_eq!(tools[0]["description"], "Label each line");
        assert_eq!(tools[0]["input_schema"]["type"], "object");
        assert_eq!(body["tool_choice"], json!({ "type": "tool", "name": "labels" }));
    }

    #[test]
    fn anthropic_parses_text_response() {
        let response = json!({
            "id": "msg_01",
            "type": "message",
            "model": "claude-3-5-haiku-20241022",
            "content": [{ "type": "text", "text": "Hello there" }],
            "usage": { "input_tokens": 10, "output_tokens": 3 }
        });

        let parsed = AnthropicAdapter.parse_response(&response, None).unwrap();
        assert_eq!(parsed.id.as_deref(), Some("msg_01"));
        assert_eq!(parsed.content, "Hello there");
        assert_eq!(
            parsed.usage,
            Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 3,
                total_tokens: 13
            })
        );
    }

    #[test]
    fn anthropic_parses_tool_use_and_unwraps() {
        let response = json!({
            "id": "msg_02",
            "content": [
                { "type": "text", "text": "Here you go" },
                { "type": "tool_use", "id": "toolu_1", "name": "labels",
                  "input": { "items": ["a", "b"] } }
            ]
        });

        let parsed = AnthropicAdapter
            .parse_response(&response, Some(&labels_output()))
            .unwrap();
        let value: Value = serde_json::from_str(&parsed.content).unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn anthropic_ignores_tool_use_without_schema() {
        let response = json!({
            "content": [
                { "type": "tool_use", "name": "x", "input": {} },
                { "type": "text", "text": "plain" }
            ]
        });

        let parsed = AnthropicAdapter.parse_response(&response, None).unwrap();
        assert_eq!(parsed.content, "plain");
    }

    #[test]
    fn anthropic_rejects_unexpected_content() {
        let response = json!({
            "content": [{ "type": "tool_use", "name": "x", "input": {} }]
        });
        let err = AnthropicAdapter.parse_response(&response, None).unwrap_err();
        assert!(matches!(err, PlaygroundError::UnexpectedResponseType { .. }));

        let missing = json!({ "id": "msg_03" });
        assert!(AnthropicAdapter.parse_response(&missing, None).is_err());
    }

    #[test]
    fn anthropic_usage_total_saturates_on_huge_counts() {
        let response = json!({
            "content": [{ "type": "text", "text": "ok" }],
            "usage": { "input_tokens": u64::MAX, "output_tokens": 1 }
        });

        let usage = AnthropicAdapter.parse_response(&response, None).unwrap().usage.unwrap();
        assert_eq!(usage.total_tokens, u64::MAX);
        assert_eq!(usage.completion_tokens, 1);
    }
}
