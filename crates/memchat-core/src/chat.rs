//! Chat backend seam.
//!
//! The pipeline treats implementations as black-box async I/O: one
//! request in, a structured reply or an error out. Retries, timeouts and
//! cancellation belong to the implementation; a transport timeout
//! surfaces here as an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::Fact;

/// Request payload for one conversational exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's text, already trimmed and non-empty.
    pub text: String,
    /// The session the exchange belongs to.
    pub session_id: String,
    /// Whether stored facts may be injected into this exchange.
    pub use_memory: bool,
}

/// Structured reply from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The assistant's reply text.
    pub reply: String,
    /// Facts the backend reports as used, in report order.
    #[serde(default)]
    pub used_facts: Vec<Fact>,
    /// The backend's view of the store size after the exchange.
    #[serde(default)]
    pub fact_count: usize,
}

/// A request/response chat transport.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Dispatches one exchange and resolves to a reply or an error.
    async fn dispatch(&self, request: ChatRequest) -> Result<ChatReply>;
}
