//! Document upload endpoint

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::IngestResponse;

/// POST /api/sessions/:id/document - Index a document into a session
pub async fn upload_document(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let form = UploadForm::read(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| Error::InvalidRequest("multipart field 'file' is required".to_string()))?;

    let response = state.upload(session_id, &file.filename, &file.data).await?;
    tracing::info!(
        "Indexed '{}' into session {}: {} chunks in {}ms{}",
        response.filename,
        session_id,
        response.chunks,
        response.processing_time_ms,
        if response.cached { " (cached)" } else { "" }
    );
    Ok(Json(response))
}

/// Uploaded file part
pub(crate) struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

/// Fields accepted by the upload and ask forms
#[derive(Default)]
pub(crate) struct UploadForm {
    pub session_id: Option<Uuid>,
    pub file: Option<UploadedFile>,
    pub question: Option<String>,
}

impl UploadForm {
    /// Collect known fields; unknown fields are skipped
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or("").to_string();
                    let data = field.bytes().await.map_err(multipart_error)?;
                    // Browsers send an empty part when no file is chosen
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    let filename = if filename.is_empty() {
                        format!("upload_{}.bin", Uuid::new_v4())
                    } else {
                        filename
                    };
                    form.file = Some(UploadedFile { filename, data });
                }
                "session_id" => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    let raw = raw.trim();
                    if !raw.is_empty() {
                        let id = Uuid::parse_str(raw).map_err(|e| {
                            Error::InvalidRequest(format!("invalid session_id '{}': {}", raw, e))
                        })?;
                        form.session_id = Some(id);
                    }
                }
                "question" => {
                    form.question = Some(field.text().await.map_err(multipart_error)?);
                }
                other => {
                    tracing::debug!("Ignoring multipart field '{}'", other);
                }
            }
        }

        Ok(form)
    }
}

fn multipart_error(err: MultipartError) -> Error {
    Error::InvalidRequest(format!("failed to read multipart body: {}", err.body_text()))
}
