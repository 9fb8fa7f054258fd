//! Offline chat backend with canned replies.
//!
//! Stands in for the real service when no backend is reachable: replies
//! are scripted, latency is simulated, and when memory usage is enabled
//! the first few stored facts are reported as used. Useful for demos and
//! for exercising the full pipeline without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;

use memchat_core::chat::{ChatBackend, ChatReply, ChatRequest};
use memchat_core::error::Result;
use memchat_core::memory::MemoryStore;

const DEFAULT_LATENCY: Duration = Duration::from_millis(1500);

/// How many facts the demo backend reports as used per exchange.
const USED_FACT_LIMIT: usize = 3;

/// A scripted, network-free chat backend.
pub struct DemoChatBackend {
    store: Arc<dyn MemoryStore>,
    latency: Duration,
}

impl DemoChatBackend {
    /// Creates a demo backend reading facts from the given store.
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            latency: DEFAULT_LATENCY,
        }
    }

    /// Overrides the simulated latency (tests use zero).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn canned_reply(query: &str, fact_count: usize) -> String {
        let templates = [
            format!(
                "I understand you're asking about \"{query}\". This is a scripted reply showing how a memory-enhanced exchange would look."
            ),
            format!(
                "That's an interesting question about \"{query}\". A connected backend would draw on the session's stored facts to answer it."
            ),
            format!(
                "Thank you for asking about \"{query}\". This offline mode exercises the client; point it at a running service for real replies."
            ),
            format!(
                "I'm processing your query about \"{query}\". With a live backend this reply would come from the assistant model."
            ),
        ];

        let index = rand::thread_rng().gen_range(0..templates.len());
        let mut reply = templates[index].clone();

        if fact_count > 0 {
            reply.push_str(&format!(
                "\n\n[Using {fact_count} stored memories for context]"
            ));
        }

        reply
    }
}

#[async_trait]
impl ChatBackend for DemoChatBackend {
    async fn dispatch(&self, request: ChatRequest) -> Result<ChatReply> {
        sleep(self.latency).await;

        let facts = if request.use_memory {
            self.store.list().await.unwrap_or_default()
        } else {
            Vec::new()
        };

        let reply = Self::canned_reply(&request.text, facts.len());
        let fact_count = facts.len();
        let used_facts = facts.into_iter().take(USED_FACT_LIMIT).collect();

        Ok(ChatReply {
            reply,
            used_facts,
            fact_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memchat_infrastructure::InMemoryMemoryStore;

    fn backend() -> (DemoChatBackend, Arc<InMemoryMemoryStore>) {
        let store = Arc::new(InMemoryMemoryStore::new());
        let backend =
            DemoChatBackend::new(store.clone()).with_latency(Duration::from_millis(0));
        (backend, store)
    }

    fn request(use_memory: bool) -> ChatRequest {
        ChatRequest {
            text: "hello".to_string(),
            session_id: "session_1_abc".to_string(),
            use_memory,
        }
    }

    #[tokio::test]
    async fn test_reply_mentions_query() {
        let (backend, _store) = backend();

        let reply = backend.dispatch(request(true)).await.unwrap();

        assert!(reply.reply.contains("hello"));
        assert!(reply.used_facts.is_empty());
    }

    #[tokio::test]
    async fn test_reports_at_most_three_used_facts() {
        let (backend, store) = backend();
        for i in 0..5 {
            store.add(&format!("key{i}"), "value").await.unwrap();
        }

        let reply = backend.dispatch(request(true)).await.unwrap();

        assert_eq!(reply.used_facts.len(), 3);
        assert_eq!(reply.fact_count, 5);
        assert_eq!(reply.used_facts[0].key, "key0");
    }

    #[tokio::test]
    async fn test_memory_disabled_reports_nothing() {
        let (backend, store) = backend();
        store.add("city", "Lagos").await.unwrap();

        let reply = backend.dispatch(request(false)).await.unwrap();

        assert!(reply.used_facts.is_empty());
        assert_eq!(reply.fact_count, 0);
    }
}
