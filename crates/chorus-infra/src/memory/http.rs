//! HTTP memory backend.
//!
//! Speaks a small JSON protocol against a remote memory service:
//!
//! | Operation          | Request                                         | Response          |
//! |--------------------|-------------------------------------------------|-------------------|
//! | `add_memory`       | `POST {base}/memories` `{messages, user_id, metadata}` | `{results: [...]}` |
//! | `search_memory`    | `POST {base}/memories/search` `{query, user_id, limit}` | `{results: [...]}` |
//! | `get_all_memories` | `GET {base}/memories?user_id=...`               | `{results: [...]}` |
//! | `delete_memory`    | `DELETE {base}/memories/{id}`                   | any 2xx or 404    |
//!
//! The service does its own extraction, so `add_memory` sends every turn.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use chorus_core::memory::backend::MemoryBackend;
use chorus_types::chat::Turn;
use chorus_types::config::MemoryConfig;
use chorus_types::memory::{MemoryError, MemoryMetadata, MemoryRecord};

use crate::secret::resolve_api_key;

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    messages: Vec<WireTurn<'a>>,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a MemoryMetadata>,
}

#[derive(Debug, Serialize)]
struct WireTurn<'a> {
    role: String,
    content: &'a str,
    turn_id: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    user_id: &'a str,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct ResultsResponse {
    results: Vec<MemoryRecord>,
}

/// Remote memory service client.
///
/// Does not derive Debug, so the token cannot end up in logs.
pub struct HttpMemoryBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpMemoryBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, MemoryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MemoryError::Unreachable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Backend for `config.remote_url`, or `None` when no remote is configured.
    pub fn from_config(config: &MemoryConfig) -> Result<Option<Self>, MemoryError> {
        let Some(url) = config.remote_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };
        let api_key = resolve_api_key(config.api_key_env.as_deref());
        Self::new(url, api_key, Duration::from_secs(config.timeout_secs)).map(Some)
    }

    fn memories_url(&self) -> String {
        format!("{}/memories", self.base_url)
    }

    fn memory_url(&self, memory_id: &str) -> Result<reqwest::Url, MemoryError> {
        let mut url = reqwest::Url::parse(&self.memories_url())
            .map_err(|e| MemoryError::Unreachable(format!("invalid memory service URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| MemoryError::Unreachable("memory service URL cannot take a path".to_string()))?
            .push(memory_id);
        Ok(url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, MemoryError> {
        self.authorize(builder)
            .send()
            .await
            .map_err(|e| MemoryError::Unreachable(e.to_string()))
    }

    async fn results(&self, builder: reqwest::RequestBuilder) -> Result<Vec<MemoryRecord>, MemoryError> {
        let response = self.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: ResultsResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::Malformed(e.to_string()))?;
        Ok(parsed.results)
    }
}

impl MemoryBackend for HttpMemoryBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn add_memory(
        &self,
        turns: &[Turn],
        user_id: &str,
        metadata: Option<&MemoryMetadata>,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let body = AddRequest {
            messages: turns
                .iter()
                .map(|t| WireTurn {
                    role: t.role.to_string(),
                    content: &t.content,
                    turn_id: t.id.to_string(),
                })
                .collect(),
            user_id,
            metadata,
        };
        self.results(self.client.post(self.memories_url()).json(&body))
            .await
    }

    async fn search_memory(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let body = SearchRequest {
            query,
            user_id,
            limit,
        };
        let url = format!("{}/search", self.memories_url());
        let mut records = owned_by(self.results(self.client.post(url).json(&body)).await?, user_id);
        records.truncate(limit);
        Ok(records)
    }

    async fn get_all_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self
            .results(
                self.client
                    .get(self.memories_url())
                    .query(&[("user_id", user_id)]),
            )
            .await?;
        Ok(owned_by(records, user_id))
    }

    async fn delete_memory(&self, memory_id: &str) -> Result<(), MemoryError> {
        let url = self.memory_url(memory_id)?;
        let response = self.send(self.client.delete(url)).await?;
        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MemoryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Records the service returned for other users are never passed on.
fn owned_by(records: Vec<MemoryRecord>, user_id: &str) -> Vec<MemoryRecord> {
    records.into_iter().filter(|r| r.user_id == user_id).collect()
}
