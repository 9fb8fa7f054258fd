pub mod chat;
pub mod client;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod session;

// Re-export the common error type and client facade
pub use client::MemoryChatClient;
pub use error::{MemchatError, Result};
