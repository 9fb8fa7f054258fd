//! File-backed memory store.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use memchat_core::error::{MemchatError, Result};
use memchat_core::memory::{Fact, MemoryStats, MemoryStore, validate_entry};

/// The local memory store variant.
///
/// Facts are held in insertion order and mirrored to a single JSON file:
/// the whole collection is loaded at construction and rewritten on every
/// successful mutation, so contents survive process restarts. Operations
/// are synchronous under the hood and fail only on invalid input or
/// file-system trouble.
pub struct JsonFileMemoryStore {
    file_path: PathBuf,
    facts: RwLock<Vec<Fact>>,
}

impl JsonFileMemoryStore {
    /// Opens the store at the given file path.
    ///
    /// Parent directories are created if missing; a previously persisted
    /// collection is loaded, an absent file starts the store empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or if an
    /// existing file cannot be read or parsed.
    pub fn open(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let facts = if file_path.exists() {
            let json = fs::read_to_string(&file_path)?;
            serde_json::from_str(&json)?
        } else {
            Vec::new()
        };

        Ok(Self {
            file_path,
            facts: RwLock::new(facts),
        })
    }

    /// Opens the store at the default location (~/.memchat/memories.json).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or if
    /// the store cannot be opened.
    pub fn default_location() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| MemchatError::io("failed to get home directory"))?;
        Self::open(home_dir.join(".memchat").join("memories.json"))
    }

    /// The file the collection is persisted to.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn persist(&self, facts: &[Fact]) -> Result<()> {
        let json = serde_json::to_string_pretty(facts)?;
        fs::write(&self.file_path, json)?;
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for JsonFileMemoryStore {
    async fn add(&self, key: &str, value: &str) -> Result<Fact> {
        let (key, value) = validate_entry(key, value)?;
        let fact = Fact::new(key, value);

        let mut facts = self.facts.write().await;

        // Build the next collection, persist it, then commit in memory,
        // so a write failure leaves the store matching the file.
        let mut next = facts.clone();
        match next.iter_mut().find(|f| f.key == fact.key) {
            Some(existing) => *existing = fact.clone(),
            None => next.push(fact.clone()),
        }
        self.persist(&next)?;
        *facts = next;

        tracing::debug!(key = %fact.key, total = facts.len(), "fact persisted");
        Ok(fact)
    }

    async fn clear(&self) -> Result<()> {
        let mut facts = self.facts.write().await;
        self.persist(&[])?;
        facts.clear();
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
