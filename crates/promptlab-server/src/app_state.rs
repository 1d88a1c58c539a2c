// ABOUTME: Shared application state for the promptlab HTTP server.
// ABOUTME: Holds the credential and prompt registries and the executor wired to them.

use std::sync::Arc;

use promptlab_providers::{Executor, HttpTransport, ReqwestTransport};

use crate::registry::{CredentialRegistry, PromptRegistry};

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub credentials: Arc<CredentialRegistry>,
    pub prompts: Arc<PromptRegistry>,
    pub executor: Executor,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// State whose executor dispatches through `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let credentials = Arc::new(CredentialRegistry::new());
        let prompts = Arc::new(PromptRegistry::new());
        let executor = Executor::new(transport, credentials.clone(), prompts.clone());
        Self {
            credentials,
            prompts,
            executor,
        }
    }

    /// State that talks to the real provider APIs.
    pub fn with_network() -> Self {
        Self::new(Arc::new(ReqwestTransport::new()))
    }
}
