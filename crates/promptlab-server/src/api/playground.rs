// ABOUTME: Playground API handlers: execute a prompt, preview its masked request, list its variables.
// ABOUTME: Execute and preview share one builder, so the preview is what execute would dispatch.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use promptlab_core::model::{NormalizedResult, PlaygroundRequest, RawRequest};
use promptlab_core::template::{dataset_variables, extract_variables};

use crate::api::{ApiError, ApiJson};
use crate::app_state::SharedState;

/// Request body for variable extraction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesRequest {
    #[serde(default)]
    pub template: String,
    /// Dataset rows whose keys are offered as additional variable names.
    #[serde(default)]
    pub dataset_items: Vec<Map<String, Value>>,
}

/// Response body for variable extraction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesResponse {
    pub variables: Vec<String>,
    pub dataset_variables: Vec<String>,
}

/// POST /api/playground/execute - Run a prompt against its provider.
pub async fn execute(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<PlaygroundRequest>,
) -> Result<Json<NormalizedResult>, ApiError> {
    let result = state.executor.execute(&req).await?;
    Ok(Json(result))
}

/// POST /api/playground/preview - Build the provider request without sending it.
pub async fn preview(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<PlaygroundRequest>,
) -> Result<Json<RawRequest>, ApiError> {
    let raw = state.executor.preview(&req).await?;
    Ok(Json(raw))
}

/// POST /api/playground/variables - Placeholder names in first-appearance order.
pub async fn variables(ApiJson(req): ApiJson<VariablesRequest>) -> Json<VariablesResponse> {
    Json(VariablesResponse {
        variables: extract_variables(&req.template),
        dataset_variables: dataset_variables(&req.dataset_items),
    })
}
