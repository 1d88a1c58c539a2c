// ABOUTME: HTTP server for promptlab, exposing playground execution and provider registration.
// ABOUTME: Uses Axum with shared in-memory registries and a single executor.

pub mod api;
pub mod app_state;
pub mod config;
pub mod registry;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, PromptlabConfig};
pub use registry::{CredentialRegistry, PromptRegistry, ProviderRecord};
pub use routes::create_router;
