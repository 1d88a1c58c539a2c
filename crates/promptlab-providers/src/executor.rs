// ABOUTME: Execution orchestrator: resolves credentials and prompts, builds, dispatches, and normalizes.
// ABOUTME: Runs one provider call per execution as an explicit state machine, with no retries.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use promptlab_core::model::{
    NormalizedResult, PlaygroundRequest, PromptVersion, Provider, ProviderCredentials, RawRequest,
};
use promptlab_core::template::{coerce_variables, merge_variables};
use promptlab_core::PlaygroundError;

use crate::request::{BuiltRequest, RequestSpec, build_request};
use crate::response::normalize;
use crate::transport::HttpTransport;

/// Where an execution is. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    ResolvingCredentials,
    BuildingRequest,
    Dispatching,
    NormalizingResponse,
    Done,
    Failed,
}

/// Lookup of stored provider credentials, keyed by provider.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credentials(&self, provider: Provider) -> Option<ProviderCredentials>;
}

/// Lookup of the newest version of a stored prompt.
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn latest_version(&self, prompt_id: &str) -> Option<PromptVersion>;
}

/// The outcome of one execution together with every state it passed through.
#[derive(Debug)]
pub struct ExecutionReport {
    pub states: Vec<ExecutionState>,
    pub result: Result<NormalizedResult, PlaygroundError>,
}

struct Execution {
    states: Vec<ExecutionState>,
}

impl Execution {
    fn new() -> Self {
        Self {
            states: vec![ExecutionState::Idle],
        }
    }

    fn enter(&mut self, next: ExecutionState) {
        tracing::trace!(from = ?self.current(), to = ?next, "execution state change");
        self.states.push(next);
    }

    fn current(&self) -> ExecutionState {
        self.states.last().copied().unwrap_or(ExecutionState::Idle)
    }
}

/// Drives playground executions. Holds no per-execution state, so one
/// instance serves any number of concurrent callers.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialSource>,
    prompts: Arc<dyn PromptSource>,
}

impl Executor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialSource>,
        prompts: Arc<dyn PromptSource>,
    ) -> Self {
        Self {
            transport,
            credentials,
            prompts,
        }
    }

    /// Execute a playground request end to end.
    pub async fn execute(
        &self,
        request: &PlaygroundRequest,
    ) -> Result<NormalizedResult, PlaygroundError> {
        self.run(request).await.result
    }

    /// Execute and also report the state transitions taken.
    pub async fn run(&self, request: &PlaygroundRequest) -> ExecutionReport {
        let mut execution = Execution::new();
        let result = self.drive(request, &mut execution).await;

        if let Err(ref e) = result {
            tracing::warn!(
                state = ?execution.current(),
                status = e.status_code(),
                error = %e,
                "playground execution failed"
            );
            execution.enter(ExecutionState::Failed);
        }

        ExecutionReport {
            states: execution.states,
            result,
        }
    }

    /// Build the request exactly as `execute` would and return its masked
    /// form without dispatching. Missing credentials are not an error here:
    /// the preview renders with a placeholder key.
    pub async fn preview(&self, request: &PlaygroundRequest) -> Result<RawRequest, PlaygroundError> {
        let (provider, model) = validate_target(request)?;
        let credentials = match self.credentials.credentials(provider).await {
            Some(c) => c,
            None => {
                tracing::debug!(provider = %provider, "previewing without stored credentials");
                ProviderCredentials::default()
            }
        };
        let spec = self.request_spec(request, provider, model, credentials).await?;
        Ok(build_request(&spec)?.display())
    }

    async fn drive(
        &self,
        request: &PlaygroundRequest,
        execution: &mut Execution,
    ) -> Result<NormalizedResult, PlaygroundError> {
        let (provider, model) = validate_target(request)?;

        execution.enter(ExecutionState::ResolvingCredentials);
        let credentials = self
            .credentials
            .credentials(provider)
            .await
            .ok_or_else(|| PlaygroundError::Configuration(provider.to_string()))?;

        execution.enter(ExecutionState::BuildingRequest);
        let spec = self.request_spec(request, provider, model, credentials).await?;
        let built = build_request(&spec)?;

        execution.enter(ExecutionState::Dispatching);
        tracing::info!(
            provider = %provider,
            model = %spec.model,
            url = %built.url(),
            "dispatching playground request"
        );
        let response = self.transport.send(&built).await?;
        if !response.is_success() {
            return Err(provider_error(response.status, &response.body));
        }

        execution.enter(ExecutionState::NormalizingResponse);
        let result = normalize(provider, &response.body, built.structured(), built.display())?;

        execution.enter(ExecutionState::Done);
        log_completion(&built, &result);
        Ok(result)
    }

    /// Resolve the template (ad hoc or from a stored prompt) and variables
    /// into builder input.
    async fn request_spec(
        &self,
        request: &PlaygroundRequest,
        provider: Provider,
        model: String,
        credentials: ProviderCredentials,
    ) -> Result<RequestSpec, PlaygroundError> {
        let mut response_schema = request.response_schema.clone();

        let template = match (&request.template, &request.prompt_id) {
            (Some(t), _) if !t.is_empty() => t.clone(),
            (_, Some(prompt_id)) => {
                let version = self
                    .prompts
                    .latest_version(prompt_id)
                    .await
                    .ok_or_else(|| PlaygroundError::PromptNotFound(prompt_id.clone()))?;
                if response_schema.is_none() {
                    response_schema = version.response_schema;
                }
                version.template
            }
            _ => String::new(),
        };

        if template.is_empty() && request.messages.is_none() {
            return Err(PlaygroundError::Validation(
                "Template or messages are required".to_string(),
            ));
        }

        let manual = coerce_variables(&request.variables);
        let variables = match &request.dataset_item {
            Some(item) => merge_variables(Some(item), &manual),
            None => manual,
        };

        Ok(RequestSpec {
            provider,
            model,
            template,
            variables,
            config: request.config.clone(),
            credentials,
            response_schema,
            messages: request.messages.clone(),
        })
    }
}

fn validate_target(request: &PlaygroundRequest) -> Result<(Provider, String), PlaygroundError> {
    let provider = request.provider.trim();
    let model = request.model.trim();
    if provider.is_empty() || model.is_empty() {
        return Err(PlaygroundError::Validation(
            "Provider and model are required".to_string(),
        ));
    }
    Ok((provider.parse()?, model.to_string()))
}

/// Upstream failure with the vendor's `error.message` when present, else the
/// HTTP status line.
fn provider_error(status: u16, body: &str) -> PlaygroundError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| {
            let reason = reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown Status");
            format!("HTTP {} {}", status, reason)
        });

    PlaygroundError::Provider {
        status: Some(status),
        message,
    }
}

fn log_completion(built: &BuiltRequest, result: &NormalizedResult) {
    match result.usage {
        Some(usage) => tracing::info!(
            provider = %built.provider(),
            model = %result.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "playground execution complete"
        ),
        None => tracing::info!(
            provider = %built.provider(),
            model = %result.model,
            "playground execution complete"
        ),
    }
}
