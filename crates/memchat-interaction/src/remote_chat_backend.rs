//! HTTP chat transport for the memchat backend service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use memchat_core::chat::{ChatBackend, ChatReply, ChatRequest};
use memchat_core::error::{MemchatError, Result};
use memchat_core::memory::Fact;

use crate::config::ClientConfig;

/// Chat backend that talks to the memchat service over HTTP.
///
/// Transport failures map to `BackendUnavailable`; a response the service
/// itself marked unsuccessful maps to `BackendRejected`. No retries are
/// performed here; a failed exchange is terminal.
#[derive(Clone)]
pub struct RemoteChatBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatApiRequest<'a> {
    query: &'a str,
    session_id: &'a str,
    use_memory: bool,
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    memories_used: Vec<UsedMemory>,
    #[serde(default)]
    memory_count: usize,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsedMemory {
    key: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    access_count: u64,
}

impl From<UsedMemory> for Fact {
    fn from(m: UsedMemory) -> Self {
        Fact {
            key: m.key,
            value: m.value,
            created_at: m.timestamp.unwrap_or_default(),
            access_count: m.access_count,
        }
    }
}

/// Service liveness report from the health endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub active_sessions: usize,
    #[serde(default)]
    pub timestamp: String,
}

impl RemoteChatBackend {
    /// Creates a backend with explicit settings.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
            timeout: ClientConfig::default().timeout(),
        }
    }

    /// Creates a backend from loaded client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
        }
    }

    /// Probes the service health endpoint.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the service cannot be reached or
    /// answers with a non-success status.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/api/health", self.base_url);
        let request = self.auth_request(self.client.get(&url).timeout(self.timeout));

        let response = request
            .send()
            .await
            .map_err(|e| MemchatError::backend_unavailable(format!("health check failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MemchatError::backend_unavailable(format!(
                "health check returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MemchatError::backend_unavailable(format!("invalid health payload: {e}")))
    }

    /// Attaches the bearer token when one is configured.
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.api_key {
            request.header("Authorization", format!("Bearer {}", api_key))
        } else {
            request
        }
    }
}

#[async_trait]
impl ChatBackend for RemoteChatBackend {
    async fn dispatch(&self, request: ChatRequest) -> Result<ChatReply> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatApiRequest {
            query: &request.text,
            session_id: &request.session_id,
            use_memory: request.use_memory,
        };

        let http_request =
            self.auth_request(self.client.post(&url).json(&body).timeout(self.timeout));

        let response = http_request.send().await.map_err(|e| {
            MemchatError::backend_unavailable(format!("chat request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            tracing::warn!(%status, "chat request rejected");
            return Err(MemchatError::backend_rejected(extract_error(&error_text)));
        }

        let parsed: ChatApiResponse = response.json().await.map_err(|e| {
            MemchatError::backend_rejected(format!("invalid chat payload: {e}"))
        })?;

        if !parsed.success {
            return Err(MemchatError::backend_rejected(
                parsed.error.unwrap_or_else(|| "request refused".to_string()),
            ));
        }

        Ok(ChatReply {
            reply: parsed.response.unwrap_or_default(),
            used_facts: parsed.memories_used.into_iter().map(Fact::from).collect(),
            fact_count: parsed.memory_count,
        })
    }
}

/// Pulls the `error` field out of a JSON error body, falling back to the
/// raw text.
fn extract_error(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string())
}
