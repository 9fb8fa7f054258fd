//! Session identifier generation.

use chrono::Utc;

/// Generates an opaque session identifier.
///
/// The identifier combines a millisecond timestamp prefix with a random
/// hex suffix, which is unique with overwhelming probability within a
/// process lifetime. It is not a security boundary; the caller is
/// responsible for retaining it for the session's lifetime.
pub fn new_session_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::random::<u32>();
    format!("session_{}_{:08x}", millis, suffix)
}
