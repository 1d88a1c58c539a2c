// ABOUTME: Shared data types for playground execution: providers, messages, config, credentials, results.
// ABOUTME: All values are transient and computed per execution; nothing here is persisted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PlaygroundError;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TOP_P: f64 = 1.0;

/// The LLM vendors the playground can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAI, Provider::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Models offered as choices for this provider. Callers may still send
    /// any model name; this list is never used for validation.
    pub fn suggested_models(&self) -> &'static [&'static str] {
        match self {
            Provider::OpenAI => &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"],
            Provider::Anthropic => &[
                "claude-3-5-sonnet-20241022",
                "claude-3-5-haiku-20241022",
                "claude-3-opus-20240229",
                "claude-3-sonnet-20240229",
                "claude-3-haiku-20240307",
            ],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = PlaygroundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(PlaygroundError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat turn, sent verbatim to either provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters as supplied by the caller. Unset fields fall back to
/// the defaults when a request body is assembled; keeping them optional lets
/// the Anthropic adapter tell an explicit `topP` apart from the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl GenerationConfig {
    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn top_p(&self) -> f64 {
        self.top_p.unwrap_or(DEFAULT_TOP_P)
    }
}

/// Stored credentials for one provider. `Debug` never prints the key.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Extra headers, applied only when `base_url` is also set.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ProviderCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The configured base URL without trailing slashes, or `None` when unset or blank.
    pub fn custom_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The rendered HTTP request as shown to a caller. Auth headers are always masked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Provider-independent outcome of one playground execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub id: String,
    pub content: String,
    pub usage: Option<Usage>,
    pub model: String,
    pub provider: Provider,
    pub raw_request: RawRequest,
}

/// The newest version of a stored prompt, as supplied by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptVersion {
    pub prompt_id: String,
    pub template: String,
    #[serde(default)]
    pub response_schema: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller input for execute and preview. Exactly one of `prompt_id`,
/// `template`, or `messages` ends up supplying the text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaygroundRequest {
    pub prompt_id: Option<String>,
    pub template: Option<String>,
    pub messages: Option<Vec<Message>>,
    pub provider: String,
    pub model: String,
    pub variables: Map<String, Value>,
    pub dataset_item: Option<Map<String, Value>>,
    pub config: GenerationConfig,
    pub response_schema: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_known_names() {
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!("anthropic".parse::<Provider>().unwrap(), Provider::Anthropic);

        let err = "gemini".parse::<Provider>().unwrap_err();
        assert!(matches!(err, PlaygroundError::UnsupportedProvider(ref p) if p == "gemini"));
    }

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Provider::OpenAI).unwrap(), "openai");
        assert_eq!(serde_json::to_value(Provider::Anthropic).unwrap(), "anthropic");
    }

    #[test]
    fn generation_config_defaults() {
        let config: GenerationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.temperature(), 0.7);
        assert_eq!(config.max_tokens(), 1000);
        assert_eq!(config.top_p(), 1.0);

        let config: GenerationConfig =
            serde_json::from_str(r#"{"temperature": 0.2, "maxTokens": 50}"#).unwrap();
        assert_eq!(config.temperature(), 0.2);
        assert_eq!(config.max_tokens(), 50);
        assert!(config.top_p.is_none());
    }

    #[test]
    fn credentials_debug_redacts_key() {
        let creds = ProviderCredentials::new("sk-super-secret-1234")
            .with_base_url("https://proxy.internal")
            .with_header("x-proxy-token", "hidden-value");
        let debug = format!("{:?}", creds);

        assert!(!debug.contains("sk-super-secret-1234"));
        assert!(!debug.contains("hidden-value"));
        assert!(debug.contains("x-proxy-token"));
    }

    #[test]
    fn custom_base_url_ignores_blank_and_trailing_slash() {
        assert_eq!(ProviderCredentials::new("k").custom_base_url(), None);
        assert_eq!(
            ProviderCredentials::new("k").with_base_url("  ").custom_base_url(),
            None
        );
        assert_eq!(
            ProviderCredentials::new("k")
                .with_base_url("https://x.com/v1/")
                .custom_base_url(),
            Some("https://x.com/v1")
        );
    }

    #[test]
    fn playground_request_accepts_minimal_body() {
        let req: PlaygroundRequest = serde_json::from_str(
            r#"{"provider": "openai", "model": "gpt-4o-mini", "template": "Hi {{name}}",
                "variables": {"name": "Bo"}, "config": {"temperature": 0.1}}"#,
        )
        .unwrap();

        assert_eq!(req.provider, "openai");
        assert_eq!(req.template.as_deref(), Some("Hi {{name}}"));
        assert_eq!(req.variables["name"], "Bo");
        assert_eq!(req.config.temperature, Some(0.1));
        assert!(req.messages.is_none());
    }

    #[test]
    fn normalized_result_uses_camel_case() {
        let result = NormalizedResult {
            id: "resp_1".into(),
            content: "hello".into(),
            usage: Some(Usage {
                prompt_tokens: 3,
                completion_tokens: 2,
                total_tokens: 5,
            }),
            model: "gpt-4o-mini".into(),
            provider: Provider::OpenAI,
            raw_request: RawRequest {
                url: "https://api.openai.com/v1/responses".into(),
                method: "POST".into(),
                headers: BTreeMap::new(),
                body: Value::Null,
            },
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["usage"]["promptTokens"], 3);
        assert_eq!(json["usage"]["totalTokens"], 5);
        assert_eq!(json["rawRequest"]["method"], "POST");
        assert_eq!(json["provider"], "openai");
    }
}
