// ABOUTME: HTTP transport seam between the executor and the network.
// ABOUTME: ReqwestTransport performs the single outbound call; tests substitute a stub.

use async_trait::async_trait;

use promptlab_core::PlaygroundError;

use crate::request::BuiltRequest;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a built request and returns whatever came back. Non-2xx statuses are
/// not errors at this layer; only failures to complete the exchange are.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &BuiltRequest) -> Result<HttpResponse, PlaygroundError>;
}

/// Production transport backed by a shared `reqwest::Client`. No timeout is
/// configured here; callers that need one wrap the execution.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &BuiltRequest) -> Result<HttpResponse, PlaygroundError> {
        let body = request
            .body_bytes()
            .map_err(|e| PlaygroundError::Transport(format!("failed to encode body: {}", e)))?;

        let mut builder = self.client.post(request.url());
        for (name, value) in request.dispatch_headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(body)
            .send()
            .await
            .map_err(|e| PlaygroundError::Transport(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PlaygroundError::Transport(format!("failed to read body: {}", e.without_url())))?;

        Ok(HttpResponse { status, body })
    }
}
