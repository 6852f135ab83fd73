//! doc-rag: ask questions about an uploaded document
//!
//! An uploaded PDF or text file is split into overlapping chunks, embedded
//! through Ollama and held in an in-memory index per session. Questions are
//! answered by retrieving the closest chunks and handing them to a local chat
//! model as context; reasoning markup in the reply is stripped.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{IndexedDocument, RagPipeline};
pub use session::{SessionState, SessionStore};
pub use types::{
    document::{Chunk, Document, FileType, Segment},
    query::QueryRequest,
    response::{AnswerOutcome, QueryResponse},
};
