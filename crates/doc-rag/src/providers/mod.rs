//! Provider abstractions for embeddings and chat generation
//!
//! The pipeline only talks to these traits, so tests can swap in stubs and
//! other backends can be added beside Ollama.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::{ChatMessage, ChatProvider, ChatRole};
pub use ollama::{OllamaChat, OllamaEmbedder};
