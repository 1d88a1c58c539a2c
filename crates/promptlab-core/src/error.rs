// ABOUTME: Error taxonomy for playground execution, shared by the builder, normalizer, and server.
// ABOUTME: Each variant carries an HTTP-style status classification and renders to a {error, details} body.

use serde::Serialize;
use thiserror::Error;

/// Everything that can terminate a playground execution.
///
/// Schema parse failures and unparseable structured content are deliberately
/// absent: both are recovered locally and only logged.
#[derive(Debug, Error)]
pub enum PlaygroundError {
    /// Malformed or missing caller input.
    #[error("{0}")]
    Validation(String),

    /// The requested provider has no stored credentials.
    #[error("Provider {0} is not configured. Register its credentials first.")]
    Configuration(String),

    #[error("Prompt not found")]
    PromptNotFound(String),

    #[error("Provider {0} is not supported")]
    UnsupportedProvider(String),

    /// Non-2xx from the upstream vendor.
    #[error("LLM provider error")]
    Provider { status: Option<u16>, message: String },

    /// A 2xx body that does not match any recognized shape.
    #[error("Unexpected response type from {provider}")]
    UnexpectedResponseType { provider: String, detail: String },

    /// The HTTP call itself failed (connect, TLS, body read).
    #[error("LLM provider error")]
    Transport(String),
}

impl PlaygroundError {
    /// HTTP-style status classification: bad input and missing configuration are
    /// 400-class, unknown prompts 404, upstream failures 500.
    pub fn status_code(&self) -> u16 {
        match self {
            PlaygroundError::Validation(_)
            | PlaygroundError::Configuration(_)
            | PlaygroundError::UnsupportedProvider(_) => 400,
            PlaygroundError::PromptNotFound(_) => 404,
            PlaygroundError::Provider { .. }
            | PlaygroundError::UnexpectedResponseType { .. }
            | PlaygroundError::Transport(_) => 500,
        }
    }

    /// Diagnostic detail surfaced next to the message, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            PlaygroundError::Provider {
                status: Some(status),
                message,
            } => Some(format!("{}: {}", status, message)),
            PlaygroundError::Provider {
                status: None,
                message,
            } => Some(message.clone()),
            PlaygroundError::UnexpectedResponseType { detail, .. } => Some(detail.clone()),
            PlaygroundError::Transport(message) => Some(message.clone()),
            PlaygroundError::PromptNotFound(id) => Some(format!("no versions for prompt {}", id)),
            _ => None,
        }
    }

    /// Render the normalized outer error shape.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            details: self.details(),
        }
    }
}

/// The single `{error, details?}` shape every failure is reported as.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
