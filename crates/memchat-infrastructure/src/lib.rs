//! Local infrastructure for memchat.
//!
//! Provides the device-local `MemoryStore` variants: a JSON-file-backed
//! store whose contents survive process restarts, and an in-memory store
//! for tests and ephemeral sessions.

mod in_memory_store;
mod json_file_memory_store;

pub use in_memory_store::InMemoryMemoryStore;
pub use json_file_memory_store::JsonFileMemoryStore;
