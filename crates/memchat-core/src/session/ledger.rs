//! Running count of exchanged turns.

use serde::{Deserialize, Serialize};

/// Tracks how many turns have been emitted in a session.
///
/// Each completed exchange records two turns (the user turn and the
/// assistant turn), so the displayed conversation length halves the raw
/// count. Rejected submits (busy pipeline, empty input) record nothing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnLedger {
    turn_count: u64,
}

impl TurnLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one emitted turn.
    pub fn record(&mut self) {
        self.turn_count += 1;
    }

    /// Raw number of turns recorded so far.
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    /// Number of completed user/assistant exchanges.
    ///
    /// Each pair counts as one conversation, so this is `turn_count / 2`.
    pub fn conversation_turns(&self) -> u64 {
        self.turn_count / 2
    }
}
