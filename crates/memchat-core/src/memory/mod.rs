//! Memory store abstraction.
//!
//! This module provides the trait and types for the session's fact store.
//! Two interchangeable variants exist elsewhere in the workspace: a
//! remote, service-backed store (`memchat-interaction`) and a
//! device-local, persisted store (`memchat-infrastructure`). Call sites
//! hold an `Arc<dyn MemoryStore>` and never branch on the variant.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{MemchatError, Result};

/// One stored key/value memory item attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Non-empty key, unique within a store. Re-adding an existing key
    /// is last-write-wins.
    pub key: String,
    /// The stored value.
    pub value: String,
    /// Timestamp when the fact was created (ISO 8601 format).
    pub created_at: String,
    /// Times the backend surfaced this fact to a turn. The client never
    /// increments this locally.
    #[serde(default)]
    pub access_count: u64,
}

impl Fact {
    /// Creates a fresh fact stamped with the current time.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            created_at: Utc::now().to_rfc3339(),
            access_count: 0,
        }
    }
}

/// Store-level statistics.
///
/// Must reflect the most recent completed mutation, never a cached value
/// older than the last successful `add`/`clear`. The fact listing rides
/// along so a single call can refresh both the count and a fact panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Number of stored facts.
    pub count: usize,
    /// The stored facts in insertion order.
    #[serde(default)]
    pub facts: Vec<Fact>,
}

/// A session-scoped fact store.
///
/// Both variants expose identical signatures so the message pipeline and
/// the front end are agnostic to which is active.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Stores a fact, trimming whitespace from both parts.
    ///
    /// Re-adding an existing key overwrites the stored value without
    /// changing the fact's position in the listing. Empty key or value
    /// is rejected with `InvalidArgument` before storage is touched.
    async fn add(&self, key: &str, value: &str) -> Result<Fact>;

    /// Removes all facts. Irreversible; user confirmation is the
    /// caller's responsibility.
    async fn clear(&self) -> Result<()>;

    /// Returns facts in insertion order (stable, no reordering on access).
    async fn list(&self) -> Result<Vec<Fact>>;

    /// Returns store statistics reflecting the last completed mutation.
    async fn stats(&self) -> Result<MemoryStats>;
}

/// Trims both parts of an entry and rejects empty key or value.
///
/// Store implementations call this before touching storage (or the
/// network) so `InvalidArgument` never mutates state.
pub fn validate_entry<'a>(key: &'a str, value: &'a str) -> Result<(&'a str, &'a str)> {
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() {
        return Err(MemchatError::invalid_argument("memory key must not be empty"));
    }
    if value.is_empty() {
        return Err(MemchatError::invalid_argument(
            "memory value must not be empty",
        ));
    }

    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entry_trims_both_parts() {
        let (key, value) = validate_entry("  city  ", " Lagos ").unwrap();
        assert_eq!(key, "city");
        assert_eq!(value, "Lagos");
    }

    #[test]
    fn test_validate_entry_rejects_empty() {
        assert!(validate_entry("", "v").unwrap_err().is_invalid_argument());
        assert!(validate_entry("k", "").unwrap_err().is_invalid_argument());
        assert!(validate_entry("   ", "v").unwrap_err().is_invalid_argument());
    }
}
