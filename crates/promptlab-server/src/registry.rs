// ABOUTME: In-memory registries for provider credentials and stored prompts.
// ABOUTME: Back the executor's credential and prompt lookups; nothing is persisted to disk.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use ulid::Ulid;

use promptlab_core::model::{PromptVersion, Provider, ProviderCredentials};
use promptlab_providers::{CredentialSource, PromptSource};

/// The public view of a registered provider. Never carries the key or header values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    pub id: String,
    pub provider: Provider,
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

struct StoredProvider {
    record: ProviderRecord,
    credentials: ProviderCredentials,
}

/// Provider credentials keyed by provider. Registering a provider again
/// replaces its credentials but keeps its id and creation time.
#[derive(Default)]
pub struct CredentialRegistry {
    entries: RwLock<HashMap<Provider, StoredProvider>>,
}

impl CredentialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(
        &self,
        provider: Provider,
        name: Option<String>,
        credentials: ProviderCredentials,
    ) -> ProviderRecord {
        let mut entries = self.entries.write().await;
        let base_url = credentials.base_url.clone();

        let record = match entries.get(&provider) {
            Some(existing) => ProviderRecord {
                name,
                base_url,
                ..existing.record.clone()
            },
            None => ProviderRecord {
                id: Ulid::new().to_string(),
                provider,
                name,
                base_url,
                created_at: Utc::now(),
            },
        };

        tracing::info!(
            provider = %provider,
            id = %record.id,
            custom_base_url = record.base_url.is_some(),
            custom_headers = credentials.headers.len(),
            "registered provider credentials"
        );

        entries.insert(
            provider,
            StoredProvider {
                record: record.clone(),
                credentials,
            },
        );
        record
    }

    /// All registered providers, newest first.
    pub async fn list(&self) -> Vec<ProviderRecord> {
        let entries = self.entries.read().await;
        let mut records: Vec<ProviderRecord> = entries.values().map(|s| s.record.clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        records
    }
}

#[async_trait]
impl CredentialSource for CredentialRegistry {
    async fn credentials(&self, provider: Provider) -> Option<ProviderCredentials> {
        self.entries
            .read()
            .await
            .get(&provider)
            .map(|s| s.credentials.clone())
    }
}

/// Prompt versions keyed by prompt id, oldest first.
#[derive(Default)]
pub struct PromptRegistry {
    versions: RwLock<HashMap<String, Vec<PromptVersion>>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new version of `prompt_id` and return it.
    pub async fn add_version(
        &self,
        prompt_id: &str,
        template: impl Into<String>,
        response_schema: Option<String>,
    ) -> PromptVersion {
        let version = PromptVersion {
            prompt_id: prompt_id.to_string(),
            template: template.into(),
            response_schema,
            created_at: Utc::now(),
        };
        self.versions
            .write()
            .await
            .entry(prompt_id.to_string())
            .or_default()
            .push(version.clone());
        version
    }
}

#[async_trait]
impl PromptSource for PromptRegistry {
    async fn latest_version(&self, prompt_id: &str) -> Option<PromptVersion> {
        self.versions
            .read()
            .await
            .get(prompt_id)
            .and_then(|v| v.last().cloned())
    }
}
