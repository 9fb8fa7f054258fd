//! Ephemeral memory store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use memchat_core::error::Result;
use memchat_core::memory::{Fact, MemoryStats, MemoryStore, validate_entry};

/// A memory store with no durable surface.
///
/// Same semantics as the file-backed store minus persistence; useful in
/// tests and for sessions that should leave no trace.
#[derive(Default)]
pub struct InMemoryMemoryStore {
    facts: RwLock<Vec<Fact>>,
}

impl InMemoryMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn add(&self, key: &str, value: &str) -> Result<Fact> {
        let (key, value) = validate_entry(key, value)?;
        let fact = Fact::new(key, value);

        let mut facts = self.facts.write().await;
        match facts.iter_mut().find(|f| f.key == fact.key) {
            Some(existing) => *existing = fact.clone(),
            None => facts.push(fact.clone()),
        }

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
