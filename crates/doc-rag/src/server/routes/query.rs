//! Question endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

use super::ingest::{UploadForm, UploadedFile};

/// POST /api/sessions/:id/query - Ask a question against the session's document
pub async fn query_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let response = state
        .ask(session_id, &request.question, request.top_k)
        .await?;
    Ok(Json(response))
}

/// POST /api/ask - Upload (optional) and ask in one request
///
/// Creates a session when none is given. The upload, if any, runs first; if
/// it fails the question is not asked and the session keeps its old index.
/// A session created here is dropped again when the request fails.
pub async fn ask(State(state): State<AppState>, multipart: Multipart) -> Result<Json<QueryResponse>> {
    let form = UploadForm::read(multipart).await?;
    let question = form
        .question
        .ok_or_else(|| Error::InvalidRequest("multipart field 'question' is required".to_string()))?;

    let (session_id, created) = match form.session_id {
        Some(id) => (id, false),
        None => (state.sessions().create()?, true),
    };

    let result = upload_and_ask(&state, session_id, form.file, &question).await;
    if result.is_err() && created {
        // Already gone if the idle sweep got there first
        state.sessions().remove(session_id).ok();
    }
    Ok(Json(result?))
}

async fn upload_and_ask(
    state: &AppState,
    session_id: Uuid,
    file: Option<UploadedFile>,
    question: &str,
) -> Result<QueryResponse> {
    if let Some(file) = file {
        state.upload(session_id, &file.filename, &file.data).await?;
    }
    state.ask(session_id, question, None).await
}
