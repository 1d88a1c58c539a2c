// ABOUTME: Response normalizer turning any provider's raw HTTP body into one NormalizedResult.
// ABOUTME: Unwraps array-schema envelopes and degrades to raw text when structured JSON won't parse.

use serde_json::Value;

use promptlab_core::model::{NormalizedResult, Provider, RawRequest, Usage};
use promptlab_core::{PlaygroundError, StructuredOutput};

use crate::providers::adapter_for;

/// What an adapter can pull out of a response body before the provider and
/// request metadata are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub id: Option<String>,
    pub content: String,
    pub usage: Option<Usage>,
    pub model: Option<String>,
}

/// Normalize a 2xx response body from `provider`.
///
/// `structured` is the schema metadata the request was built with; it decides
/// whether content is treated as a structured payload and which wrapper key to
/// strip. When the body omits the model, the requested model is reported.
pub fn normalize(
    provider: Provider,
    raw_body: &str,
    structured: Option<&StructuredOutput>,
    raw_request: RawRequest,
) -> Result<NormalizedResult, PlaygroundError> {
    let body: Value =
        serde_json::from_str(raw_body).map_err(|e| PlaygroundError::UnexpectedResponseType {
            provider: provider.to_string(),
            detail: format!("response body is not JSON: {}", e),
        })?;

    let parsed = adapter_for(provider).parse_response(&body, structured)?;

    let model = parsed
        .model
        .or_else(|| {
            raw_request
                .body
                .get("model")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_default();

    tracing::debug!(
        provider = %provider,
        model = %model,
        content_len = parsed.content.len(),
        has_usage = parsed.usage.is_some(),
        "normalized provider response"
    );

    Ok(NormalizedResult {
        id: parsed.id.unwrap_or_default(),
        content: parsed.content,
        usage: parsed.usage,
        model,
        provider,
        raw_request,
    })
}

/// Content for text that may carry a structured payload. Without a schema,
/// or when the text isn't JSON, the text is returned untouched.
pub(crate) fn structured_text(text: &str, structured: Option<&StructuredOutput>) -> String {
    let Some(structured) = structured else {
        return text.to_string();
    };

    match serde_json::from_str::<Value>(text) {
        Ok(value) if structured.is_wrapped() => structured_value(value, structured),
        Ok(_) => text.to_string(),
        Err(e) => {
            tracing::warn!(
                schema = %structured.name,
                error = %e,
                "structured content is not valid JSON; returning raw text"
            );
            text.to_string()
        }
    }
}

/// Content for an already-parsed structured payload, wrapper removed.
pub(crate) fn structured_value(value: Value, structured: &StructuredOutput) -> String {
    let value = structured.unwrap_payload(value);
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn raw_request(model: &str) -> RawRequest {
        RawRequest {
            url: "https://api.openai.com/v1/responses".into(),
            method: "POST".into(),
            headers: BTreeMap::new(),
            body: json!({ "model": model }),
        }
    }

    #[test]
    fn normalize_attaches_provider_and_request() {
        let body = json!({
            "id": "resp_1",
            "model": "gpt-4o-mini",
            "output": [{ "content": [{ "text": "hi" }] }]
        })
        .to_string();

        let result = normalize(Provider::OpenAI, &body, None, raw_request("gpt-4o-mini")).unwrap();
        assert_eq!(result.id, "resp_1");
        assert_eq!(result.content, "hi");
        assert_eq!(result.provider, Provider::OpenAI);
        assert_eq!(result.raw_request.method, "POST");
    }

    #[test]
    fn normalize_reports_requested_model_when_absent() {
        let body = json!({ "choices": [{ "message": { "content": "hello" } }] }).to_string();
        let result = normalize(Provider::OpenAI, &body, None, raw_request("gpt-4o")).unwrap();

        assert_eq!(result.content, "hello");
        assert_eq!(result.model, "gpt-4o");
        assert_eq!(result.id, "");
        assert!(result.usage.is_none());
    }

    #[test]
    fn normalize_rejects_non_json_body() {
        let err = normalize(Provider::Anthropic, "<html>oops</html>", None, raw_request("m"))
            .unwrap_err();
        assert!(matches!(err, PlaygroundError::UnexpectedResponseType { .. }));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn wrap_then_unwrap_round_trips_for_both_providers() {
        let schema = json!({
            "title": "Scores",
            "type": "array",
            "items": { "type": "object", "properties": { "score": { "type": "number" } } }
        });
        let structured = StructuredOutput::from_schema(schema);
        let value = json!([{ "score": 1.5 }, { "score": 3 }]);
        let envelope = json!({ "items": value.clone() });

        let openai_body = json!({
            "output": [{ "content": [{ "text": envelope.to_string() }] }]
        })
        .to_string();
        let openai =
            normalize(Provider::OpenAI, &openai_body, Some(&structured), raw_request("m"))
                .unwrap();
        assert_eq!(serde_json::from_str::<Value>(&openai.content).unwrap(), value);

        let anthropic_body = json!({
            "content": [{ "type": "tool_use", "name": "scores", "input": envelope }]
        })
        .to_string();
        let anthropic = normalize(
            Provider::Anthropic,
            &anthropic_body,
            Some(&structured),
            raw_request("m"),
        )
        .unwrap();
        assert_eq!(serde_json::from_str::<Value>(&anthropic.content).unwrap(), value);
    }

    #[test]
    fn unwrapped_object_schema_keeps_model_text() {
        let structured = StructuredOutput::from_schema(json!({ "type": "object" }));
        let text = "{\"answer\": 42}";
        assert_eq!(structured_text(text, Some(&structured)), text);
    }
}
