// ABOUTME: Configuration loading for the promptlab server.
// ABOUTME: Reads the bind address and optional bootstrap provider credentials from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use promptlab_core::model::{Provider, ProviderCredentials};

pub const DEFAULT_BIND: &str = "127.0.0.1:7341";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PROMPTLAB_BIND is not a valid socket address: {0}")]
    InvalidBind(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PromptlabConfig {
    pub bind: SocketAddr,
    /// Credentials registered at startup, one per provider with a key set.
    pub bootstrap: Vec<(Provider, ProviderCredentials)>,
}

impl PromptlabConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - PROMPTLAB_BIND: socket address to bind (default: 127.0.0.1:7341)
    /// - OPENAI_API_KEY / OPENAI_BASE_URL
    /// - ANTHROPIC_API_KEY / ANTHROPIC_BASE_URL
    ///
    /// A provider is bootstrapped only when its key variable is non-empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_str = std::env::var("PROMPTLAB_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let bootstrap = Provider::ALL
            .into_iter()
            .filter_map(|provider| bootstrap_credentials(provider).map(|c| (provider, c)))
            .collect();

        Ok(Self { bind, bootstrap })
    }
}

fn env_prefix(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAI => "OPENAI",
        Provider::Anthropic => "ANTHROPIC",
    }
}

fn bootstrap_credentials(provider: Provider) -> Option<ProviderCredentials> {
    let prefix = env_prefix(provider);
    let api_key = std::env::var(format!("{}_API_KEY", prefix))
        .ok()
        .filter(|k| !k.trim().is_empty())?;

    let mut credentials = ProviderCredentials::new(api_key);
    if let Some(base_url) = std::env::var(format!("{}_BASE_URL", prefix))
        .ok()
        .filter(|u| !u.trim().is_empty())
    {
        credentials = credentials.with_base_url(base_url);
    }
    Some(credentials)
}
