// ABOUTME: API module containing the HTTP handlers for the promptlab REST API.
// ABOUTME: Maps PlaygroundError onto status codes and the shared { error, details } body.

pub mod playground;
pub mod providers;

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use promptlab_core::PlaygroundError;

/// Handler error carrying a playground error into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub PlaygroundError);

impl From<PlaygroundError> for ApiError {
    fn from(err: PlaygroundError) -> Self {
        Self(err)
    }
}

/// Malformed or mistyped bodies are bad input like any other.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PlaygroundError::Validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// `Json` extractor whose rejections use the `{ error, details? }` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, details = ?self.0.details(), "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        (status, Json(self.0.to_body())).into_response()
    }
}
