//! Client facade.
//!
//! `MemoryChatClient` is the owned context object a front end holds: one
//! session, one memory store, one chat backend, one event stream. Nothing
//! here is ambient or global, so multiple clients can coexist in one
//! process.

use std::sync::Arc;

use crate::chat::ChatBackend;
use crate::error::Result;
use crate::memory::{Fact, MemoryStore};
use crate::pipeline::{ChatPipeline, SubmitOutcome};
use crate::session::{ClientEvent, EventReceiver, EventSender, Session, SessionStats, Turn};

/// The surface the core exposes to its front end.
///
/// Memory mutations that succeed are acknowledged with an assistant turn
/// in the transcript (matching the conversational surface of the rest of
/// the client); acknowledgement turns are display-only and do not count
/// toward the conversation length.
pub struct MemoryChatClient {
    session: Arc<Session>,
    store: Arc<dyn MemoryStore>,
    events: EventSender,
    pipeline: ChatPipeline,
}

impl MemoryChatClient {
    /// Creates a client with a freshly generated session id.
    ///
    /// Returns the client together with the receiving half of its event
    /// stream.
    pub fn new(
        store: Arc<dyn MemoryStore>,
        backend: Arc<dyn ChatBackend>,
    ) -> (Self, EventReceiver) {
        Self::with_session(Session::new(), store, backend)
    }

    /// Creates a client around an existing session.
    pub fn with_session(
        session: Session,
        store: Arc<dyn MemoryStore>,
        backend: Arc<dyn ChatBackend>,
    ) -> (Self, EventReceiver) {
        let session = Arc::new(session);
        let (events, rx) = EventSender::channel();
        let pipeline = ChatPipeline::new(
            session.clone(),
            store.clone(),
            backend,
            events.clone(),
        );

        (
            Self {
                session,
                store,
                events,
                pipeline,
            },
            rx,
        )
    }

    /// The session identifier.
    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Submits one conversational turn. See [`ChatPipeline::submit`].
    pub async fn submit(&self, text: &str, use_memory: bool) -> Result<SubmitOutcome> {
        self.pipeline.submit(text, use_memory).await
    }

    /// Stores a fact and republishes statistics.
    ///
    /// Failures are returned to the caller without touching the
    /// transcript or the stats.
    pub async fn add_fact(&self, key: &str, value: &str) -> Result<Fact> {
        let fact = self.store.add(key, value).await?;
        tracing::info!(key = %fact.key, "fact stored");

        self.events.emit(ClientEvent::TurnEmitted {
            turn: Turn::assistant(
                format!("Memory \"{}\" has been added successfully.", fact.key),
                Vec::new(),
            ),
        });
        self.pipeline.refresh_stats().await;

        Ok(fact)
    }

    /// Removes all facts and republishes statistics.
    ///
    /// Irreversible. The front end is expected to obtain explicit user
    /// confirmation before calling this.
    pub async fn clear_facts(&self) -> Result<()> {
        self.store.clear().await?;
        tracing::info!("memory store cleared");

        self.events.emit(ClientEvent::TurnEmitted {
            turn: Turn::assistant("All memories have been cleared.", Vec::new()),
        });
        self.pipeline.refresh_stats().await;

        Ok(())
    }

    /// Returns the stored facts in insertion order.
    pub async fn list_facts(&self) -> Result<Vec<Fact>> {
        self.store.list().await
    }

    /// Computes the current derived statistics.
    pub async fn current_stats(&self) -> Result<SessionStats> {
        let memory = self.store.stats().await?;
        Ok(SessionStats {
            total_facts: memory.count,
            conversation_turns: self.session.conversation_turns().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatReply, ChatRequest};
    use crate::memory::{MemoryStats, validate_entry};
    use async_trait::async_trait;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct StubStore {
        facts: RwLock<Vec<Fact>>,
    }

    #[async_trait]
    impl MemoryStore for StubStore {
        async fn add(&self, key: &str, value: &str) -> Result<Fact> {
            let (key, value) = validate_entry(key, value)?;
            let fact = Fact::new(key, value);
            self.facts.write().await.push(fact.clone());
            Ok(fact)
        }

        async fn clear(&self) -> Result<()> {
            self.facts.write().await.clear();
            Ok(())
        }

        async fn list(&self) -> Result<Vec<Fact>> {
            Ok(self.facts.read().await.clone())
        }

        async fn stats(&self) -> Result<MemoryStats> {
            let facts = self.facts.read().await.clone();
            Ok(MemoryStats {
                count: facts.len(),
                facts,
            })
        }
    }

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn dispatch(&self, request: ChatRequest) -> Result<ChatReply> {
            Ok(ChatReply {
                reply: format!("echo: {}", request.text),
                used_facts: Vec::new(),
                fact_count: 0,
            })
        }
    }

    fn client() -> (MemoryChatClient, EventReceiver) {
        MemoryChatClient::new(Arc::new(StubStore::default()), Arc::new(EchoBackend))
    }

    #[tokio::test]
    async fn test_add_fact_bumps_count_and_clear_resets_it() {
        let (client, _rx) = client();

        client.add_fact("city", "Lagos").await.unwrap();
        assert_eq!(client.current_stats().await.unwrap().total_facts, 1);

        client.clear_facts().await.unwrap();
        assert_eq!(client.current_stats().await.unwrap().total_facts, 0);
    }

    #[tokio::test]
    async fn test_invalid_fact_leaves_stats_unchanged() {
        let (client, _rx) = client();

        assert!(
            client
                .add_fact("", "value")
                .await
                .unwrap_err()
                .is_invalid_argument()
        );
        assert!(
            client
                .add_fact("key", "")
                .await
                .unwrap_err()
                .is_invalid_argument()
        );
        assert_eq!(client.current_stats().await.unwrap().total_facts, 0);
    }

    #[tokio::test]
    async fn test_add_fact_emits_confirmation_and_stats() {
        let (client, mut rx) = client();

        client.add_fact("city", "Lagos").await.unwrap();

        let ClientEvent::TurnEmitted { turn } = rx.try_recv().unwrap() else {
            panic!("expected confirmation turn");
        };
        assert!(turn.text.contains("city"));
        let ClientEvent::StatsChanged { stats } = rx.try_recv().unwrap() else {
            panic!("expected stats event");
        };
        assert_eq!(stats.total_facts, 1);
    }

    #[tokio::test]
    async fn test_stats_track_exchanges_across_submits() {
        let (client, _rx) = client();

        client.submit("one", false).await.unwrap();
        client.submit("two", false).await.unwrap();

        let stats = client.current_stats().await.unwrap();
        assert_eq!(stats.conversation_turns, 2);
    }
}
