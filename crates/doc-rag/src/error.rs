//! Error types for the document Q&A pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// The uploaded bytes are not a parseable document, or carry no text
    #[error("Unreadable document '{filename}': {message}")]
    UnreadableDocument { filename: String, message: String },

    /// Chunk overlap must be strictly smaller than the chunk length
    #[error("Invalid chunk configuration: overlap {overlap} must be smaller than max length {max_len}")]
    InvalidChunkConfig { max_len: usize, overlap: usize },

    /// Embedding service call failed (build or query)
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// Chat model call failed or timed out
    #[error("Generation service error: {0}")]
    GenerationService(String),

    /// Unknown or evicted session
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Session store is at capacity
    #[error("Session limit of {0} reached, try again later")]
    SessionLimit(usize),

    /// Malformed client request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unreadable document error
    pub fn unreadable(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnreadableDocument {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding service error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingService(message.into())
    }

    /// Create a generation service error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationService(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Machine-readable error kind, also used as the JSON `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnreadableDocument { .. } => "unreadable_document",
            Error::InvalidChunkConfig { .. } => "invalid_chunk_config",
            Error::EmbeddingService(_) => "embedding_error",
            Error::GenerationService(_) => "generation_error",
            Error::SessionNotFound(_) => "session_not_found",
            Error::SessionLimit(_) => "session_limit",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status used when this error reaches a handler boundary
    pub fn status(&self) -> StatusCode {
        match self {
            Error::UnreadableDocument { .. }
            | Error::InvalidChunkConfig { .. }
            | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::EmbeddingService(_) | Error::GenerationService(_) => StatusCode::BAD_GATEWAY,
            Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Error::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::unreadable("a.pdf", "bad header").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidChunkConfig { max_len: 10, overlap: 10 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::embedding("down").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(Error::generation("timeout").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            Error::SessionNotFound(Uuid::nil()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::SessionLimit(4).status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_display_names_file() {
        let err = Error::unreadable("notes.pdf", "not a PDF");
        assert_eq!(err.to_string(), "Unreadable document 'notes.pdf': not a PDF");
        assert_eq!(err.kind(), "unreadable_document");
    }
}
