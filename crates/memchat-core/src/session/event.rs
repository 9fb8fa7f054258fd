//! Session event stream.
//!
//! The core publishes turn and statistics changes over an unbounded
//! channel; the front end (REPL, desktop shell, tests) drains the
//! receiver and renders. A dropped receiver never wedges the pipeline.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::message::Turn;
use super::model::SessionStats;

/// High-level events published to the session's front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A submit passed the guards and entered the sending state.
    TurnStarted,
    /// A turn is ready to render (user turns are emitted optimistically,
    /// before the backend resolves).
    TurnEmitted { turn: Turn },
    /// A dispatched exchange failed; `message` is display-ready.
    TurnFailed { message: String },
    /// Derived statistics changed.
    StatsChanged { stats: SessionStats },
}

/// Receiving half of the session event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

/// Sending half of the session event stream.
///
/// Send failures mean the receiver was dropped; they are logged at debug
/// level and otherwise ignored so the pipeline can finish its transition.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl EventSender {
    /// Creates a connected sender/receiver pair.
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publishes an event to the front end.
    pub fn emit(&self, event: ClientEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event receiver dropped; discarding event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_after_receiver_dropped_is_harmless() {
        let (sender, rx) = EventSender::channel();
        drop(rx);
        sender.emit(ClientEvent::TurnStarted);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = ClientEvent::StatsChanged {
            stats: SessionStats {
                total_facts: 2,
                conversation_turns: 1,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stats_changed");
        assert_eq!(json["stats"]["total_facts"], 2);
    }
}
