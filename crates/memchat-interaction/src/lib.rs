//! Remote and offline collaborators for memchat.
//!
//! Implements the core's `ChatBackend` and `MemoryStore` seams against
//! the backend service's JSON API, plus an offline demo backend that
//! needs no network at all, and the client configuration they share.

pub mod config;
mod demo_chat_backend;
mod remote_chat_backend;
mod remote_memory_store;

pub use config::ClientConfig;
pub use demo_chat_backend::DemoChatBackend;
pub use remote_chat_backend::{HealthStatus, RemoteChatBackend};
pub use remote_memory_store::RemoteMemoryStore;
