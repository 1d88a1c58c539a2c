// ABOUTME: Provider module defining the ProviderAdapter seam and aggregating the vendor adapters.
// ABOUTME: Each sub-module maps the neutral request/response model onto one vendor's wire protocol.

pub mod anthropic;
pub mod openai;

use serde_json::Value;

use promptlab_core::model::{GenerationConfig, Message, Provider};
use promptlab_core::{PlaygroundError, StructuredOutput};

use crate::response::ParsedResponse;

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAIAdapter;

/// Everything that differs between vendors. Implementations are stateless and
/// pure, so the same adapter serves both request preview and real dispatch.
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    fn default_base_url(&self) -> &'static str;

    /// Full endpoint for a base URL that has no trailing slash.
    fn endpoint(&self, base_url: &str) -> String;

    /// Name of the header that carries the API key.
    fn auth_header_name(&self) -> &'static str;

    /// Value of the auth header for the given key (or masked key).
    fn auth_header_value(&self, api_key: &str) -> String;

    /// Fixed headers the vendor requires besides auth and content type.
    fn static_headers(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }

    /// Caller-supplied messages when non-empty, else one user message
    /// carrying the rendered template.
    fn resolve_messages(
        &self,
        rendered_template: &str,
        messages: Option<&[Message]>,
    ) -> Result<Vec<Message>, PlaygroundError> {
        match messages {
            Some(msgs) if !msgs.is_empty() => Ok(msgs.to_vec()),
            _ => Ok(vec![Message::user(rendered_template)]),
        }
    }

    /// Assemble the JSON request body.
    fn build_body(
        &self,
        model: &str,
        messages: &[Message],
        config: &GenerationConfig,
        structured: Option<&StructuredOutput>,
    ) -> Value;

    /// Extract id, content, usage, and model from a 2xx response body.
    fn parse_response(
        &self,
        body: &Value,
        structured: Option<&StructuredOutput>,
    ) -> Result<ParsedResponse, PlaygroundError>;
}

/// The adapter for a provider.
pub fn adapter_for(provider: Provider) -> &'static dyn ProviderAdapter {
    match provider {
        Provider::OpenAI => &OpenAIAdapter,
        Provider::Anthropic => &AnthropicAdapter,
    }
}

/// Read a token count that may be absent.
pub(crate) fn token_count(usage: &Value, key: &str) -> Option<u64> {
    usage.get(key).and_then(|v| v.as_u64())
}
