//! Response types returned by the pipeline and the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, FileType};

/// Chunk returned by retrieval with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (-1.0 to 1.0, higher is closer)
    pub similarity: f32,
}

/// Result of asking a question
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// No document has been indexed for this session; nothing was called
    NoDocument,
    /// The model answered using the retrieved context
    Answered {
        /// Final answer with reasoning markup removed
        answer: String,
        /// Chunks used as context, in retrieval order
        sources: Vec<ScoredChunk>,
    },
}

impl AnswerOutcome {
    /// Answer text, if any
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::NoDocument => None,
            Self::Answered { answer, .. } => Some(answer),
        }
    }
}

/// Source passage shown alongside an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnippet {
    /// Chunk position in the document
    pub chunk_index: u32,
    /// Page/section number
    pub page: u32,
    /// Similarity score
    pub similarity: f32,
    /// Passage text
    pub text: String,
}

impl From<&ScoredChunk> for SourceSnippet {
    fn from(scored: &ScoredChunk) -> Self {
        Self {
            chunk_index: scored.chunk.index,
            page: scored.chunk.segment,
            similarity: scored.similarity,
            text: scored.chunk.text.clone(),
        }
    }
}

/// Query outcome as exposed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Answer generated
    Answered,
    /// No document uploaded for this session
    NoDocument,
}

/// Response to a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Session the question was asked in
    pub session_id: Uuid,
    /// Outcome kind
    pub status: QueryStatus,
    /// Generated answer, absent when no document is indexed
    pub answer: Option<String>,
    /// Human-readable note for the form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Retrieved context passages
    pub sources: Vec<SourceSnippet>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Build a response from a pipeline outcome
    pub fn from_outcome(session_id: Uuid, outcome: &AnswerOutcome, processing_time_ms: u64) -> Self {
        match outcome {
            AnswerOutcome::NoDocument => Self {
                session_id,
                status: QueryStatus::NoDocument,
                answer: None,
                message: Some("No document uploaded. Upload a document first.".to_string()),
                sources: Vec::new(),
                processing_time_ms,
            },
            AnswerOutcome::Answered { answer, sources } => Self {
                session_id,
                status: QueryStatus::Answered,
                answer: Some(answer.clone()),
                message: None,
                sources: sources.iter().map(SourceSnippet::from).collect(),
                processing_time_ms,
            },
        }
    }
}

/// Response to a document upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Session the document was indexed into
    pub session_id: Uuid,
    /// Uploaded filename
    pub filename: String,
    /// Detected file type
    pub file_type: FileType,
    /// Extracted pages/sections
    pub segments: usize,
    /// Chunks in the index
    pub chunks: usize,
    /// True when the index came from the content-addressed cache
    pub cached: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Session state as exposed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing uploaded yet
    NoDocument,
    /// A document index is ready for questions
    DocumentIndexed,
}

/// Session summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID
    pub session_id: Uuid,
    /// Current state
    pub status: SessionStatus,
    /// Indexed filename
    pub filename: Option<String>,
    /// Number of chunks in the index
    pub chunks: usize,
    /// When the current index was installed
    pub indexed_at: Option<DateTime<Utc>>,
    /// Session creation time
    pub created_at: DateTime<Utc>,
}
