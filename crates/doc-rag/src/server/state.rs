//! Application state for the document Q&A server

use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::RagPipeline;
use crate::session::SessionStore;
use crate::types::{IngestResponse, QueryResponse, SessionSummary};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Parse, index and answer pipeline
    pipeline: RagPipeline,
    /// Per-client indices
    sessions: Arc<SessionStore>,
}

impl AppState {
    /// Create state backed by Ollama
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing document Q&A state (embed: {}, chat: {})",
            config.llm.embed_model,
            config.llm.chat_model
        );
        let pipeline = RagPipeline::from_config(&config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create state around an existing pipeline
    pub fn with_pipeline(config: RagConfig, pipeline: RagPipeline) -> Self {
        let sessions = Arc::new(SessionStore::new(&config.sessions));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                sessions,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the pipeline
    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Get the session store
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.inner.sessions
    }

    /// Index an upload into a session
    ///
    /// The session only changes once the new index is complete; a failed
    /// upload leaves the previous index in place.
    pub async fn upload(&self, session_id: Uuid, filename: &str, data: &[u8]) -> Result<IngestResponse> {
        let start = Instant::now();
        // Fail fast on unknown sessions before doing any work
        self.sessions().summary(session_id)?;

        tracing::info!("Session {}: indexing '{}' ({} bytes)", session_id, filename, data.len());
        let indexed = self.pipeline().index_document(filename, data).await?;
        self.sessions().install(session_id, &indexed)?;

        Ok(IngestResponse {
            session_id,
            filename: indexed.filename,
            file_type: indexed.file_type,
            segments: indexed.segments,
            chunks: indexed.index.len(),
            cached: indexed.cached,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Answer a question from the session's current index
    pub async fn ask(&self, session_id: Uuid, question: &str, top_k: Option<usize>) -> Result<QueryResponse> {
        let start = Instant::now();
        let index = self.sessions().current_index(session_id)?;

        tracing::info!("Session {}: question \"{}\"", session_id, question);
        let outcome = self
            .pipeline()
            .answer(index.as_deref(), question, top_k)
            .await?;

        Ok(QueryResponse::from_outcome(
            session_id,
            &outcome,
            start.elapsed().as_millis() as u64,
        ))
    }

    /// Session status
    pub fn session(&self, session_id: Uuid) -> Result<SessionSummary> {
        self.sessions().summary(session_id)
    }

    /// True when the model services respond
    pub async fn is_ready(&self) -> bool {
        self.pipeline().health_check().await
    }
}
