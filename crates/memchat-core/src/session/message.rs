//! Conversation turn types.
//!
//! Turns are transient value objects: they exist to be rendered by the
//! front end and are not persisted by the core.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::memory::Fact;

/// Represents the author of a turn in the visible exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnRole {
    /// Turn from the user.
    User,
    /// Turn from the assistant.
    Assistant,
}

/// A single message in the visible exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// The author of the turn.
    pub role: TurnRole,
    /// The content of the turn.
    pub text: String,
    /// Facts the backend reported as used for this turn, in report order.
    /// Empty unless the turn was produced with memory usage enabled and
    /// the backend reported at least one fact used.
    #[serde(default)]
    pub used_facts: Vec<Fact>,
    /// Timestamp when the turn was created (ISO 8601 format).
    pub timestamp: String,
}

impl Turn {
    /// Creates a user turn with the given text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            used_facts: Vec::new(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Creates an assistant turn carrying the facts the backend used.
    pub fn assistant(text: impl Into<String>, used_facts: Vec<Fact>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            used_facts,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
