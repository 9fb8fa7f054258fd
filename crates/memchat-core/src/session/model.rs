//! Session context and derived statistics.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::id::new_session_id;
use super::ledger::TurnLedger;

/// The context owned by one running client instance.
///
/// A session owns an opaque identifier, generated once and immutable for
/// the instance's lifetime, and the running turn ledger. It is destroyed
/// on teardown with no durable trace; multiple sessions can coexist in
/// one process.
#[derive(Debug)]
pub struct Session {
    id: String,
    ledger: RwLock<TurnLedger>,
}

impl Session {
    /// Creates a session with a freshly generated identifier.
    pub fn new() -> Self {
        Self::with_id(new_session_id())
    }

    /// Creates a session with a caller-supplied identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ledger: RwLock::new(TurnLedger::new()),
        }
    }

    /// The session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Records one emitted turn in the ledger.
    pub async fn record_turn(&self) {
        self.ledger.write().await.record();
    }

    /// Raw number of turns recorded so far.
    pub async fn turn_count(&self) -> u64 {
        self.ledger.read().await.turn_count()
    }

    /// Number of completed user/assistant exchanges.
    pub async fn conversation_turns(&self) -> u64 {
        self.ledger.read().await.conversation_turns()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived session statistics.
///
/// Never stored independently: recomputed after every mutation to the
/// session or the memory store, so displayed values are never staler than
/// the last completed mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Number of facts currently in the memory store.
    pub total_facts: usize,
    /// Number of completed user/assistant exchanges.
    pub conversation_turns: u64,
}
