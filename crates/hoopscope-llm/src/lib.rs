// Reasoning backend abstraction and its HTTP client.

pub mod client;

pub use client::{BackendError, LlmClient, OllamaClient, ReasoningBackend};
