//! Session domain module.
//!
//! This module contains everything scoped to one client session: identity
//! generation, the turn ledger, conversation turn types, derived statistics,
//! and the event stream consumed by the front end.
//!
//! # Module Structure
//!
//! - `id`: session identifier generation
//! - `ledger`: running turn count (`TurnLedger`)
//! - `message`: conversation turn types (`TurnRole`, `Turn`)
//! - `model`: session context and derived statistics (`Session`, `SessionStats`)
//! - `event`: the event stream (`ClientEvent`, `EventSender`)

mod event;
mod id;
mod ledger;
mod message;
mod model;

// Re-export public API
pub use event::{ClientEvent, EventReceiver, EventSender};
pub use id::new_session_id;
pub use ledger::TurnLedger;
pub use message::{Turn, TurnRole};
pub use model::{Session, SessionStats};
