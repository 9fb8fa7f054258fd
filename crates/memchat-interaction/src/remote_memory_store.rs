//! Service-backed memory store.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use memchat_core::error::{MemchatError, Result};
use memchat_core::memory::{Fact, MemoryStats, MemoryStore, validate_entry};

use crate::config::ClientConfig;

/// The remote memory store variant.
///
/// Every operation is one HTTP call keyed by session id; nothing is held
/// locally, so a failed call leaves no partial state behind. The service
/// exposes no standalone list route, so `list()` is served from the
/// stats payload's item listing (keys, timestamps and access counts;
/// values live only on the service).
#[derive(Clone)]
pub struct RemoteMemoryStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    session_id: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct AddMemoryRequest<'a> {
    session_id: &'a str,
    key: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct ClearMemoryRequest<'a> {
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    stats: Option<StatsPayload>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsPayload {
    #[serde(default)]
    total_memories: usize,
    #[serde(default)]
    memory_items: Vec<MemoryItem>,
}

#[derive(Debug, Deserialize)]
struct MemoryItem {
    key: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    access_count: u64,
}

impl From<MemoryItem> for Fact {
    fn from(item: MemoryItem) -> Self {
        Fact {
            key: item.key,
            value: String::new(),
            created_at: item.timestamp.unwrap_or_default(),
            access_count: item.access_count,
        }
    }
}

impl RemoteMemoryStore {
    /// Creates a store bound to a session with explicit settings.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
            session_id: session_id.into(),
            timeout: ClientConfig::default().timeout(),
        }
    }

    /// Creates a store bound to a session from loaded configuration.
    pub fn from_config(config: &ClientConfig, session_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            session_id: session_id.into(),
            timeout: config.timeout(),
        }
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.api_key {
            request.header("Authorization", format!("Bearer {}", api_key))
        } else {
            request
        }
    }

    /// Sends a mutation and checks the service's acknowledgement.
    async fn post_ack(&self, url: String, body: impl Serialize) -> Result<()> {
        let request = self.auth_request(self.client.post(&url).json(&body).timeout(self.timeout));

        let response = request.send().await.map_err(|e| {
            MemchatError::backend_unavailable(format!("memory request failed: {e}"))
        })?;

        let status = response.status();
        let ack: AckResponse = response.json().await.map_err(|e| {
            MemchatError::backend_rejected(format!("invalid memory payload: {e}"))
        })?;

        if !status.is_success() || !ack.success {
            let message = ack.error.unwrap_or_else(|| format!("status {}", status));
            tracing::warn!(%status, %message, "memory request rejected");
            return Err(MemchatError::backend_rejected(message));
        }

        Ok(())
    }

    async fn fetch_stats(&self) -> Result<StatsPayload> {
        let url = format!(
            "{}/api/memory/stats?session_id={}",
            self.base_url, self.session_id
        );
        let request = self.auth_request(self.client.get(&url).timeout(self.timeout));

        let response = request.send().await.map_err(|e| {
            MemchatError::backend_unavailable(format!("stats request failed: {e}"))
        })?;

        let status = response.status();
        let parsed: StatsResponse = response.json().await.map_err(|e| {
            MemchatError::backend_unavailable(format!("invalid stats payload: {e}"))
        })?;

        if !status.is_success() || !parsed.success {
            let message = parsed.error.unwrap_or_else(|| format!("status {}", status));
            return Err(MemchatError::backend_unavailable(message));
        }

        parsed
            .stats
            .ok_or_else(|| MemchatError::backend_unavailable("stats payload missing"))
    }
}

#[async_trait]
impl MemoryStore for RemoteMemoryStore {
    async fn add(&self, key: &str, value: &str) -> Result<Fact> {
        // Reject bad input before touching the network; the service
        // validates again on its side.
        let (key, value) = validate_entry(key, value)?;

        let url = format!("{}/api/memory/add", self.base_url);
        self.post_ack(
            url,
            AddMemoryRequest {
                session_id: &self.session_id,
                key,
                value,
            },
        )
        .await?;

        Ok(Fact::new(key, value))
    }

    async fn clear(&self) -> Result<()> {
        let url = format!("{}/api/memory/clear", self.base_url);
        self.post_ack(
            url,
            ClearMemoryRequest {
                session_id: &self.session_id,
            },
        )
        .await
    }

    async fn list(&self) -> Result<Vec<Fact>> {
        let stats = self.fetch_stats().await?;
        Ok(stats.memory_items.into_iter().map(Fact::from).collect())
    }

    async fn stats(&self) -> Result<MemoryStats> {
        let stats = self.fetch_stats().await?;
        Ok(MemoryStats {
            count: stats.total_memories,
            facts: stats.memory_items.into_iter().map(Fact::from).collect(),
        })
    }
}
