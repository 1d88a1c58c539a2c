// ABOUTME: Request builder mapping a playground input onto a fully specified provider HTTP request.
// ABOUTME: Pure and deterministic so the preview shown to users is exactly what gets dispatched.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use promptlab_core::model::{GenerationConfig, Message, Provider, ProviderCredentials, RawRequest};
use promptlab_core::{PlaygroundError, StructuredOutput, Variables, normalize_schema, substitute};

use crate::providers::adapter_for;

pub const METHOD: &str = "POST";

/// Inputs to [`build_request`].
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub provider: Provider,
    pub model: String,
    pub template: String,
    pub variables: Variables,
    pub config: GenerationConfig,
    pub credentials: ProviderCredentials,
    /// JSON Schema text; invalid JSON silently disables structured output.
    pub response_schema: Option<String>,
    /// Used instead of the rendered template when present and non-empty.
    pub messages: Option<Vec<Message>>,
}

/// A request ready for dispatch. Holds the real auth header for the transport
/// and a masked copy for anything shown to a caller. `Debug` lists header
/// names only.
#[derive(Clone)]
pub struct BuiltRequest {
    provider: Provider,
    url: String,
    headers: BTreeMap<String, String>,
    display_headers: BTreeMap<String, String>,
    body: Value,
    structured: Option<StructuredOutput>,
}

impl BuiltRequest {
    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &'static str {
        METHOD
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn structured(&self) -> Option<&StructuredOutput> {
        self.structured.as_ref()
    }

    /// Headers with the unmasked API key. Only the transport should read these.
    pub fn dispatch_headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Serialized body, identical for preview and dispatch.
    pub fn body_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.body)
    }

    /// The masked request description returned to callers.
    pub fn display(&self) -> RawRequest {
        RawRequest {
            url: self.url.clone(),
            method: METHOD.to_string(),
            headers: self.display_headers.clone(),
            body: self.body.clone(),
        }
    }
}

impl fmt::Debug for BuiltRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltRequest")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("headers", &self.display_headers.keys().collect::<Vec<_>>())
            .field("body", &self.body)
            .finish()
    }
}

/// Mask an API key to `sk-...` plus its last four characters. Keys of four
/// characters or fewer are not revealed at all.
pub fn mask_api_key(api_key: &str) -> String {
    let len = api_key.chars().count();
    if len <= 4 {
        return "sk-...KEY".to_string();
    }
    let tail: String = api_key.chars().skip(len - 4).collect();
    format!("sk-...{}", tail)
}

/// Insert a header, replacing any existing header with the same name in any case.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

/// Build the provider request for `spec`.
///
/// Custom credential headers are merged only when a custom base URL is set,
/// and can never replace the auth header.
pub fn build_request(spec: &RequestSpec) -> Result<BuiltRequest, PlaygroundError> {
    let adapter = adapter_for(spec.provider);

    let rendered = substitute(&spec.template, &spec.variables);
    let messages = adapter.resolve_messages(&rendered, spec.messages.as_deref())?;

    let custom_base = spec.credentials.custom_base_url();
    let url = adapter.endpoint(custom_base.unwrap_or(adapter.default_base_url()));

    let structured = normalize_schema(spec.response_schema.as_deref());
    let body = adapter.build_body(&spec.model, &messages, &spec.config, structured.as_ref());

    let auth_name = adapter.auth_header_name();
    let mut headers = BTreeMap::new();
    set_header(&mut headers, "Content-Type", "application/json".to_string());
    for (name, value) in adapter.static_headers() {
        set_header(&mut headers, name, value.to_string());
    }
    if custom_base.is_some() {
        for (name, value) in &spec.credentials.headers {
            if name.eq_ignore_ascii_case(auth_name) {
                tracing::warn!(header = %name, "custom header would replace the auth header; skipped");
                continue;
            }
            set_header(&mut headers, name, value.clone());
        }
    }

    let mut display_headers = headers.clone();
    set_header(
        &mut headers,
        auth_name,
        adapter.auth_header_value(&spec.credentials.api_key),
    );
    set_header(
        &mut display_headers,
        auth_name,
        adapter.auth_header_value(&mask_api_key(&spec.credentials.api_key)),
    );

    tracing::debug!(
        provider = %spec.provider,
        model = %spec.model,
        url = %url,
        messages = messages.len(),
        schema = structured.as_ref().map(|s| s.name.as_str()).unwrap_or("none"),
        wrapped = structured.as_ref().is_some_and(StructuredOutput::is_wrapped),
        "built provider request"
    );

    Ok(BuiltRequest {
        provider: spec.provider,
        url,
        headers,
        display_headers,
        body,
        structured,
    })
}
