//! Configuration for the document Q&A server

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration
///
/// Every section falls back to its defaults, so a TOML file only needs the
/// keys it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Per-session state configuration
    pub sessions: SessionConfig,
    /// Built index cache configuration
    pub cache: CacheConfig,
    /// Reasoning markup removal
    pub reasoning: ReasoningConfig,
    /// Document parsing configuration
    pub parsing: ParsingConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would otherwise fail at request time
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::InvalidChunkConfig {
                max_len: self.chunking.chunk_size,
                overlap: self.chunking.chunk_overlap,
            });
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.reasoning.start_marker.is_empty() || self.reasoning.end_marker.is_empty() {
            return Err(Error::Config("reasoning markers must not be empty".to_string()));
        }
        if self.sessions.max_sessions == 0 {
            return Err(Error::Config("sessions.max_sessions must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Chat model name
    pub chat_model: String,
    /// Sampling temperature, left to the model default when unset
    pub temperature: Option<f32>,
    /// HTTP request timeout in seconds (embedding calls)
    pub timeout_secs: u64,
    /// Upper bound on a single chat completion in seconds
    pub generation_timeout_secs: u64,
    /// Number of retries for failed embedding requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "deepseek-r1:8b".to_string(),
            chat_model: "deepseek-r1:8b".to_string(),
            temperature: None,
            timeout_secs: 60,
            generation_timeout_secs: 300,
            max_retries: 2,
        }
    }
}

impl LlmConfig {
    /// Timeout applied to each chat completion
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks passed to the model as context
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle time after which a session and its index are dropped
    pub idle_ttl_secs: u64,
    /// How often the eviction sweep runs
    pub sweep_interval_secs: u64,
    /// Maximum concurrently live sessions
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 30 * 60,
            sweep_interval_secs: 60,
            max_sessions: 256,
        }
    }
}

/// Content-addressed index cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable reuse of built indices for identical uploads
    pub enabled: bool,
    /// Maximum number of cached indices
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 16,
        }
    }
}

/// Reasoning markup removal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Marker opening a reasoning span
    pub start_marker: String,
    /// Marker closing a reasoning span
    pub end_marker: String,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            start_marker: "<think>".to_string(),
            end_marker: "</think>".to_string(),
        }
    }
}

/// Document parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Timeout for extracting text from one document in seconds
    pub parse_timeout_secs: u64,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            parse_timeout_secs: 60,
        }
    }
}

impl ParsingConfig {
    /// Parse timeout as a duration
    pub fn parse_timeout(&self) -> Duration {
        Duration::from_secs(self.parse_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.llm.chat_model, "deepseek-r1:8b");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RagConfig::from_toml_str(
            r#"
            [server]
            port = 9000

            [retrieval]
            top_k = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.reasoning.start_marker, "<think>");
    }

    #[test]
    fn test_overlap_not_below_size_rejected() {
        let err = RagConfig::from_toml_str(
            r#"
            [chunking]
            chunk_size = 100
            chunk_overlap = 100
            "#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidChunkConfig { max_len: 100, overlap: 100 }
        ));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let err = RagConfig::from_toml_str("[retrieval]\ntop_k = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
