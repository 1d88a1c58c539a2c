// ABOUTME: Provider registry API handlers for registering and listing LLM credentials.
// ABOUTME: Responses never include API keys or custom header values.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use promptlab_core::PlaygroundError;
use promptlab_core::model::{Provider, ProviderCredentials};
use promptlab_providers::CredentialSource;

use crate::api::{ApiError, ApiJson};
use crate::app_state::SharedState;
use crate::registry::ProviderRecord;

/// Request body for registering a provider.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProviderRequest {
    pub provider: Option<String>,
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// A provider as listed. `headers` is always empty.
#[derive(Debug, Serialize)]
pub struct ProviderListing {
    #[serde(flatten)]
    pub record: ProviderRecord,
    pub headers: BTreeMap<String, String>,
}

/// GET /api/providers - Registered providers, newest first.
pub async fn list_providers(State(state): State<SharedState>) -> Json<Vec<ProviderListing>> {
    let listings = state
        .credentials
        .list()
        .await
        .into_iter()
        .map(|record| ProviderListing {
            record,
            headers: BTreeMap::new(),
        })
        .collect();
    Json(listings)
}

/// Models offered for one provider.
#[derive(Debug, Serialize)]
pub struct ModelCatalogEntry {
    pub provider: Provider,
    pub configured: bool,
    pub models: &'static [&'static str],
}

/// GET /api/providers/models - Suggested models per provider and whether
/// credentials are registered for it.
pub async fn list_models(State(state): State<SharedState>) -> Json<Vec<ModelCatalogEntry>> {
    let mut catalog = Vec::with_capacity(Provider::ALL.len());
    for provider in Provider::ALL {
        catalog.push(ModelCatalogEntry {
            provider,
            configured: state.credentials.credentials(provider).await.is_some(),
            models: provider.suggested_models(),
        });
    }
    Json(catalog)
}

/// POST /api/providers - Create or replace a provider's credentials.
pub async fn register_provider(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<RegisterProviderRequest>,
) -> Result<(StatusCode, Json<ProviderRecord>), ApiError> {
    let provider = req.provider.as_deref().map(str::trim).unwrap_or_default();
    let api_key = req.api_key.unwrap_or_default();
    if provider.is_empty() || api_key.trim().is_empty() {
        return Err(PlaygroundError::Validation("Provider and API key are required".to_string()).into());
    }
    let provider: Provider = provider.parse()?;

    let credentials = ProviderCredentials {
        api_key,
        base_url: req.base_url.filter(|u| !u.trim().is_empty()),
        headers: req.headers,
    };
    let record = state.credentials.upsert(provider, req.name, credentials).await;

    Ok((StatusCode::CREATED, Json(record)))
}
