//! Message pipeline.
//!
//! Orchestrates one conversational turn: builds a request from user text,
//! the session id, and the memory-usage flag, dispatches it, and resolves
//! to either an assistant reply or a failure turn. The `Idle`/`Sending`
//! state cell is the sole concurrency control; it exists to stop the
//! user-visible effect of overlapping submits, not to protect shared
//! memory.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chat::{ChatBackend, ChatRequest};
use crate::error::Result;
use crate::memory::MemoryStore;
use crate::session::{ClientEvent, EventSender, Session, SessionStats, Turn};

/// Pipeline state. At most one request is ever in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Idle,
    Sending,
}

/// Why a submit was dropped before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another submit is already in flight; the new one is dropped, not
    /// queued.
    Busy,
    /// The text was empty after trimming.
    EmptyInput,
}

/// Outcome of a submit call.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The exchange resolved; the assistant turn (reply or failure text)
    /// is returned.
    Completed(Turn),
    /// The submit was dropped before any state transition.
    Rejected(RejectReason),
}

/// Drives the `Idle`/`Sending` state machine for one session.
pub struct ChatPipeline {
    session: Arc<Session>,
    store: Arc<dyn MemoryStore>,
    backend: Arc<dyn ChatBackend>,
    events: EventSender,
    state: Mutex<PipelineState>,
}

impl ChatPipeline {
    /// Creates a pipeline bound to a session, store, and backend.
    pub fn new(
        session: Arc<Session>,
        store: Arc<dyn MemoryStore>,
        backend: Arc<dyn ChatBackend>,
        events: EventSender,
    ) -> Self {
        Self {
            session,
            store,
            backend,
            events,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// Submits one conversational turn.
    ///
    /// Empty text and submits issued while another is in flight are
    /// dropped without a state transition. Otherwise the user turn is
    /// emitted immediately (before any network completion), the request
    /// is dispatched, and the resolution produces the assistant turn.
    /// A backend failure becomes an assistant turn carrying a short
    /// error string; no retry is performed. Either way the pipeline
    /// returns to idle and statistics are refreshed.
    pub async fn submit(&self, text: &str, use_memory: bool) -> Result<SubmitOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SubmitOutcome::Rejected(RejectReason::EmptyInput));
        }

        // Single-flight guard: check-and-set, never held across an await.
        {
            let mut state = self.state.lock().await;
            if *state == PipelineState::Sending {
                tracing::debug!("submit dropped: a request is already in flight");
                return Ok(SubmitOutcome::Rejected(RejectReason::Busy));
            }
            *state = PipelineState::Sending;
        }

        self.events.emit(ClientEvent::TurnStarted);

        // Optimistic: the user turn is visible before the backend resolves.
        let user_turn = Turn::user(text);
        self.record_and_emit(user_turn).await;

        let request = ChatRequest {
            text: text.to_string(),
            session_id: self.session.id().to_string(),
            use_memory,
        };

        tracing::debug!(
            session_id = %request.session_id,
            use_memory,
            "dispatching chat request"
        );
        let dispatched = self.backend.dispatch(request).await;

        {
            let mut state = self.state.lock().await;
            *state = PipelineState::Idle;
        }

        let assistant_turn = match dispatched {
            Ok(reply) => {
                tracing::debug!(
                    used_facts = reply.used_facts.len(),
                    "chat request resolved"
                );
                Turn::assistant(reply.reply, reply.used_facts)
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                self.events.emit(ClientEvent::TurnFailed {
                    message: err.to_string(),
                });
                Turn::assistant(format!("Error: {}", err), Vec::new())
            }
        };

        self.record_and_emit(assistant_turn.clone()).await;
        self.refresh_stats().await;

        Ok(SubmitOutcome::Completed(assistant_turn))
    }

    /// Recomputes derived statistics and republishes them.
    ///
    /// A failed store read leaves the previously displayed values stale;
    /// the failure is logged and no event is emitted.
    pub async fn refresh_stats(&self) {
        match self.store.stats().await {
            Ok(memory) => {
                let stats = SessionStats {
                    total_facts: memory.count,
                    conversation_turns: self.session.conversation_turns().await,
                };
                self.events.emit(ClientEvent::StatsChanged { stats });
            }
            Err(err) => {
                tracing::warn!(error = %err, "stats refresh failed; previous values are stale");
            }
        }
    }

    async fn record_and_emit(&self, turn: Turn) {
        self.session.record_turn().await;
        self.events.emit(ClientEvent::TurnEmitted { turn });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatReply;
    use crate::error::MemchatError;
    use crate::memory::{Fact, MemoryStats, validate_entry};
    use crate::session::{EventReceiver, TurnRole};
    use async_trait::async_trait;
    use tokio::sync::{Notify, RwLock};

    /// Minimal in-process store for pipeline tests.
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

    /// Backend that replies with a fixed result, optionally gated on a
    /// notification so tests can observe the in-flight state.
    struct ScriptedBackend {
        reply: std::result::Result<ChatReply, MemchatError>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
        gated: bool,
    }

    impl ScriptedBackend {
        fn immediate(reply: std::result::Result<ChatReply, MemchatError>) -> Self {
            Self {
                reply,
                entered: Arc::new(Notify::new()),
                release: Arc::new(Notify::new()),
                gated: false,
            }
        }

        fn gated(reply: ChatReply) -> Self {
            Self {
                reply: Ok(reply),
                entered: Arc::new(Notify::new()),
                release: Arc::new(Notify::new()),
                gated: true,
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn dispatch(&self, _request: ChatRequest) -> Result<ChatReply> {
            self.entered.notify_one();
            if self.gated {
                self.release.notified().await;
            }
            self.reply.clone()
        }
    }

    fn reply(text: &str, used_facts: Vec<Fact>) -> ChatReply {
        ChatReply {
            reply: text.to_string(),
            fact_count: used_facts.len(),
            used_facts,
        }
    }

    fn pipeline(
        backend: Arc<ScriptedBackend>,
    ) -> (Arc<ChatPipeline>, Arc<StubStore>, EventReceiver) {
        let store = Arc::new(StubStore::default());
        let (events, rx) = EventSender::channel();
        let pipeline = Arc::new(ChatPipeline::new(
            Arc::new(Session::with_id("test-session")),
            store.clone(),
            backend,
            events,
        ));
        (pipeline, store, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_transition() {
        let backend = Arc::new(ScriptedBackend::immediate(Ok(reply("hi", vec![]))));
        let (pipeline, _store, mut rx) = pipeline(backend);

        let outcome = pipeline.submit("   ", true).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::EmptyInput));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_successful_submit_emits_user_then_assistant_turn() {
        let backend = Arc::new(ScriptedBackend::immediate(Ok(reply("hello back", vec![]))));
        let (pipeline, _store, mut rx) = pipeline(backend);

        let outcome = pipeline.submit("hello", true).await.unwrap();

        let SubmitOutcome::Completed(turn) = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(turn.role, TurnRole::Assistant);
        assert!(turn.used_facts.is_empty());

        let events = drain(&mut rx);
        assert!(matches!(events[0], ClientEvent::TurnStarted));
        let ClientEvent::TurnEmitted { turn: user } = &events[1] else {
            panic!("expected user turn, got {:?}", events[1]);
        };
        assert_eq!(user.role, TurnRole::User);
        assert_eq!(user.text, "hello");
        let ClientEvent::TurnEmitted { turn: assistant } = &events[2] else {
            panic!("expected assistant turn, got {:?}", events[2]);
        };
        assert_eq!(assistant.role, TurnRole::Assistant);
        let ClientEvent::StatsChanged { stats } = &events[3] else {
            panic!("expected stats, got {:?}", events[3]);
        };
        assert_eq!(stats.conversation_turns, 1);
    }

    #[tokio::test]
    async fn test_used_facts_preserve_report_order() {
        let used = vec![Fact::new("city", "Lagos"), Fact::new("name", "Ada")];
        let backend = Arc::new(ScriptedBackend::immediate(Ok(reply("ok", used.clone()))));
        let (pipeline, _store, _rx) = pipeline(backend);

        let outcome = pipeline.submit("hello", true).await.unwrap();

        let SubmitOutcome::Completed(turn) = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(turn.used_facts.len(), 2);
        assert_eq!(turn.used_facts[0].key, "city");
        assert_eq!(turn.used_facts[1].key, "name");
    }

    #[tokio::test]
    async fn test_overlapping_submit_is_dropped_not_queued() {
        let backend = Arc::new(ScriptedBackend::gated(reply("slow reply", vec![])));
        let (pipeline, _store, _rx) = pipeline(backend.clone());

        let first = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.submit("first", false).await })
        };
        backend.entered.notified().await;

        // Pipeline is now Sending; the second submit must be a no-op.
        let second = pipeline.submit("second", false).await.unwrap();
        assert_eq!(second, SubmitOutcome::Rejected(RejectReason::Busy));

        backend.release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, SubmitOutcome::Completed(_)));

        // Only the first submit produced an exchange.
        assert_eq!(pipeline.session.turn_count().await, 2);
    }

    #[tokio::test]
    async fn test_backend_failure_produces_error_turn_and_returns_to_idle() {
        let backend = Arc::new(ScriptedBackend::immediate(Err(
            MemchatError::backend_unavailable("connection refused"),
        )));
        let (pipeline, store, mut rx) = pipeline(backend);
        store.add("city", "Lagos").await.unwrap();

        let outcome = pipeline.submit("hello", true).await.unwrap();

        let SubmitOutcome::Completed(turn) = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(turn.role, TurnRole::Assistant);
        assert!(turn.text.contains("Error"));
        assert!(turn.used_facts.is_empty());

        // Store state is untouched by a chat failure.
        assert_eq!(store.stats().await.unwrap().count, 1);

        let events = drain(&mut rx);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ClientEvent::TurnFailed { .. }))
        );

        // The pipeline is idle again: a fresh submit is accepted.
        let retry = pipeline.submit("hello again", true).await.unwrap();
        assert!(matches!(retry, SubmitOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_failed_exchange_still_counts_toward_conversation_turns() {
        let backend = Arc::new(ScriptedBackend::immediate(Err(
            MemchatError::backend_rejected("bad request"),
        )));
        let (pipeline, _store, _rx) = pipeline(backend);

        pipeline.submit("hello", false).await.unwrap();

        assert_eq!(pipeline.session.turn_count().await, 2);
        assert_eq!(pipeline.session.conversation_turns().await, 1);
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_wedge_submit() {
        let backend = Arc::new(ScriptedBackend::immediate(Ok(reply("ok", vec![]))));
        let (pipeline, _store, rx) = pipeline(backend);
        drop(rx);

        let outcome = pipeline.submit("hello", false).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
    }
}
