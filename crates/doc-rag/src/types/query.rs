//! Query request types

use serde::{Deserialize, Serialize};

/// Question asked against a session's indexed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,
    /// Override the configured number of retrieved chunks
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    /// Create a request with the configured retrieval depth
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }
}
