//! API routes for the document Q&A server

pub mod ingest;
pub mod query;
pub mod sessions;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

const INDEX_HTML: &str = include_str!("../../../static/index.html");

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        // Upload - with larger body limit for files
        .route(
            "/sessions/:id/document",
            post(ingest::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/sessions/:id/query", post(query::query_session))
        // One-shot form endpoint
        .route(
            "/ask",
            post(query::ask).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/info", get(info))
}

/// GET / - The upload and question form
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let cache = state.pipeline().cache_stats();
    Json(serde_json::json!({
        "name": "doc-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Ask questions about an uploaded document using a local model",
        "models": {
            "embedding": state.pipeline().embed_model(),
            "chat": state.pipeline().chat_model(),
        },
        "chunking": {
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
        },
        "top_k": config.retrieval.top_k,
        "sessions": state.sessions().len(),
        "cache": cache.map(|c| serde_json::json!({
            "entries": c.entries,
            "hits": c.hits,
            "misses": c.misses,
        })),
        "endpoints": {
            "GET /": "Upload and question form",
            "POST /api/sessions": "Create a session",
            "GET /api/sessions/:id": "Session status",
            "DELETE /api/sessions/:id": "Delete a session",
            "POST /api/sessions/:id/document": "Upload a document (multipart field 'file')",
            "POST /api/sessions/:id/query": "Ask a question (JSON {question})",
            "POST /api/ask": "Upload and ask in one request (multipart)",
        }
    }))
}
