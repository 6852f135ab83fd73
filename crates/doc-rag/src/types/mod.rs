//! Core types for the pipeline

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, FileType, Segment};
pub use query::QueryRequest;
pub use response::{
    AnswerOutcome, IngestResponse, QueryResponse, QueryStatus, ScoredChunk, SessionStatus,
    SessionSummary, SourceSnippet,
};
