// ABOUTME: OpenAI adapter for the Responses API (POST /v1/responses).
// ABOUTME: Embeds structured output as text.format json_schema and tolerates several response shapes.

use serde_json::{Value, json};

use promptlab_core::model::{GenerationConfig, Message, Provider, Usage};
use promptlab_core::{PlaygroundError, StructuredOutput};

use crate::providers::{ProviderAdapter, token_count};
use crate::response::{ParsedResponse, structured_text};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI Responses API adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIAdapter;

impl ProviderAdapter for OpenAIAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn default_base_url(&self) -> &'static str {
        DEFAULT_BASE_URL
    }

    /// Bases that already end in `/v1` get `/responses` appended directly so
    /// the path never carries a doubled version segment.
    fn endpoint(&self, base_url: &str) -> String {
        if base_url.ends_with("/v1") {
            format!("{}/responses", base_url)
        } else {
            format!("{}/v1/responses", base_url)
        }
    }

    fn auth_header_name(&self) -> &'static str {
        "Authorization"
    }

    fn auth_header_value(&self, api_key: &str) -> String {
        format!("Bearer {}", api_key)
    }

    fn build_body(
        &self,
        model: &str,
        messages: &[Message],
        config: &GenerationConfig,
        structured: Option<&StructuredOutput>,
    ) -> Value {
        let mut body = json!({
            "model": model,
            "input": messages,
            "temperature": config.temperature(),
            "max_output_tokens": config.max_tokens(),
            "top_p": config.top_p(),
            "store": false
        });

        if let Some(structured) = structured {
            body["text"] = json!({
                "format": {
                    "type": "json_schema",
                    "name": structured.name,
                    "strict": true,
                    "schema": structured.schema
                }
            });
        }

        body
    }

    /// Content lookup order: the first `output[].content[].text`, then
    /// `text` (string or `{content}`), then `choices[0].message.content`,
    /// then a top-level `content` string, then empty.
    fn parse_response(
        &self,
        body: &Value,
        structured: Option<&StructuredOutput>,
    ) -> Result<ParsedResponse, PlaygroundError> {
        let text = output_text(body)
            .or_else(|| text_field(body))
            .or_else(|| chat_completion_content(body))
            .or_else(|| body.get("content").and_then(|c| c.as_str()))
            .unwrap_or("");

        let content = if text.is_empty() {
            String::new()
        } else {
            structured_text(text, structured)
        };

        Ok(ParsedResponse {
            id: body.get("id").and_then(|v| v.as_str()).map(String::from),
            content,
            usage: parse_usage(body),
            model: body.get("model").and_then(|v| v.as_str()).map(String::from),
        })
    }
}

fn output_text(body: &Value) -> Option<&str> {
    body.get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(|c| c.as_array()))
        .flatten()
        .find_map(|part| part.get("text").and_then(|t| t.as_str()))
}

fn text_field(body: &Value) -> Option<&str> {
    match body.get("text")? {
        Value::String(s) => Some(s.as_str()),
        other => other.get("content").and_then(|c| c.as_str()),
    }
}

fn chat_completion_content(body: &Value) -> Option<&str> {
    body.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
}

/// Accepts both Responses (`input_tokens`/`output_tokens`) and Chat
/// Completions (`prompt_tokens`/`completion_tokens`) field names.
fn parse_usage(body: &Value) -> Option<Usage> {
    let usage = body.get("usage").filter(|u| u.is_object())?;

    let prompt_tokens = token_count(usage, "input_tokens")
        .or_else(|| token_count(usage, "prompt_tokens"))
        .unwrap_or(0);
    let completion_tokens = token_count(usage, "output_tokens")
        .or_else(|| token_count(usage, "completion_tokens"))
        .unwrap_or(0);
    let total_tokens = token_count(usage, "total_tokens")
        .unwrap_or_else(|| prompt_tokens.saturating_add(completion_tokens));

    Some(Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens,
    })
}
