// ABOUTME: Test utilities for promptlab-providers: a scripted HTTP transport and static sources.
// ABOUTME: Lets executor and server tests run full executions without network access.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use promptlab_core::PlaygroundError;
use promptlab_core::model::{PromptVersion, Provider, ProviderCredentials};

use crate::executor::{CredentialSource, PromptSource};
use crate::request::BuiltRequest;
use crate::transport::{HttpResponse, HttpTransport};

/// A request as the stub transport received it, real headers included.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// A transport that replays scripted responses in order and records every
/// request it is handed. Once the script runs out it answers 500.
#[derive(Debug, Default)]
pub struct StubTransport {
    script: Mutex<VecDeque<Result<HttpResponse, String>>>,
    captured: Mutex<Vec<CapturedRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stub that answers once with 200 and `body`.
    pub fn ok(body: Value) -> Self {
        Self::new().respond_json(200, body)
    }

    pub fn respond_json(self, status: u16, body: Value) -> Self {
        self.respond_text(status, &body.to_string())
    }

    pub fn respond_text(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }))
    }

    /// Script a failure to complete the exchange.
    pub fn fail_with(self, message: &str) -> Self {
        self.push(Err(message.to_string()))
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(self, entry: Result<HttpResponse, String>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(entry);
        self
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: &BuiltRequest) -> Result<HttpResponse, PlaygroundError> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedRequest {
                url: request.url().to_string(),
                headers: request.dispatch_headers().clone(),
                body: request.body().clone(),
            });

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(PlaygroundError::Transport(message)),
            None => Ok(HttpResponse {
                status: 500,
                body: r#"{"error":{"message":"stub transport has no scripted response"}}"#
                    .to_string(),
            }),
        }
    }
}

/// Fixed credentials per provider.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    entries: HashMap<Provider, ProviderCredentials>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: Provider, credentials: ProviderCredentials) -> Self {
        self.entries.insert(provider, credentials);
        self
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn credentials(&self, provider: Provider) -> Option<ProviderCredentials> {
        self.entries.get(&provider).cloned()
    }
}

/// Fixed prompts, one version each.
#[derive(Debug, Default)]
pub struct StaticPrompts {
    versions: HashMap<String, PromptVersion>,
}

impl StaticPrompts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, prompt_id: &str, template: &str, schema: Option<&str>) -> Self {
        self.versions.insert(
            prompt_id.to_string(),
            PromptVersion {
                prompt_id: prompt_id.to_string(),
                template: template.to_string(),
                response_schema: schema.map(String::from),
                created_at: Utc::now(),
            },
        );
        self
    }
}

#[async_trait]
impl PromptSource for StaticPrompts {
    async fn latest_version(&self, prompt_id: &str) -> Option<PromptVersion> {
        self.versions.get(prompt_id).cloned()
    }
}
