//! Axum route handlers for the Candidates API: the resume pool and uploads.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::documents::{extract_plain_text, mime_from_filename};
use crate::errors::AppError;
use crate::matching::normalize::{normalize, CandidateResume};
use crate::resume_parser::{name_from_filename, parse_resume, ResumeParserKind};
use crate::state::AppState;

/// Request body cap for uploads: a handful of maximum-size documents.
pub const MAX_UPLOAD_BYTES: usize = 5 * crate::documents::MAX_DOCUMENT_BYTES + 64 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub candidates: Vec<CandidateResume>,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SaveCandidateResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ImportedResume {
    pub filename: String,
    pub id: String,
    pub candidate: CandidateResume,
}

#[derive(Debug, Serialize)]
pub struct FailedImport {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub imported: Vec<ImportedResume>,
    pub errors: Vec<FailedImport>,
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    bytes: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates
///
/// Returns the store's pool in canonical shape.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<CandidateListResponse>, AppError> {
    let raw = state.store.fetch_all_candidates().await?;
    Ok(Json(CandidateListResponse {
        candidates: state.engine.normalize_all(&raw),
        source: state.store.source(),
    }))
}

/// POST /api/v1/candidates
pub async fn handle_save_candidate(
    State(state): State<AppState>,
    Json(candidate): Json<Value>,
) -> Result<(StatusCode, Json<SaveCandidateResponse>), AppError> {
    if !candidate.is_object() {
        return Err(AppError::Validation(
            "candidate must be a JSON object".to_string(),
        ));
    }
    let saved = state.store.save_candidate(&candidate).await?;
    info!(id = %saved.id, "candidate saved");
    Ok((StatusCode::CREATED, Json(SaveCandidateResponse { id: saved.id })))
}

/// POST /api/v1/candidates/upload
///
/// Multipart fields: `file` or `files` (repeatable), optional `name`, optional
/// `parser` (`keyword` | `llm`). A single-file upload fails with the file's
/// error; a batch reports per-file errors alongside the imported records.
pub async fn handle_upload_resumes(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files = Vec::new();
    let mut name: Option<String> = None;
    let mut parser = ResumeParserKind::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" | "files" => {
                let filename = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                files.push(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            "name" => {
                let value = field.text().await.map_err(multipart_error)?;
                name = Some(value.trim().to_string()).filter(|n| !n.is_empty());
            }
            "parser" => {
                let value = field.text().await.map_err(multipart_error)?;
                parser = value.parse().map_err(AppError::Validation)?;
            }
            other => warn!(field = other, "ignoring unknown multipart field"),
        }
    }

    if files.is_empty() {
        return Err(AppError::Validation("no file received".to_string()));
    }

    // An explicit name only makes sense for a single resume.
    let name = if files.len() == 1 { name } else { None };
    let single = files.len() == 1;

    let mut response = UploadResponse {
        imported: Vec::new(),
        errors: Vec::new(),
    };
    for file in files {
        let filename = file.filename.clone();
        match import_resume(&state, file, name.as_deref(), parser).await {
            Ok(imported) => response.imported.push(imported),
            Err(err) if single => return Err(err),
            Err(err) => {
                warn!(filename = %filename, error = %err, "resume import failed");
                response.errors.push(FailedImport {
                    filename,
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        imported = response.imported.len(),
        failed = response.errors.len(),
        "resume upload processed"
    );
    Ok(Json(response))
}

/// Extract → parse → save → normalize for one uploaded document.
async fn import_resume(
    state: &AppState,
    file: UploadedFile,
    name: Option<&str>,
    parser: ResumeParserKind,
) -> Result<ImportedResume, AppError> {
    let mime = file
        .content_type
        .as_deref()
        .filter(|ct| !ct.is_empty() && !ct.starts_with("application/octet-stream"))
        .or_else(|| mime_from_filename(&file.filename))
        .unwrap_or("application/octet-stream");

    let text = extract_plain_text(&file.bytes, mime)?;
    let mut record = parse_resume(parser, &text, state.engine.config(), state.llm.as_ref()).await?;

    if let Value::Object(fields) = &mut record {
        let has_name = fields
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|n| !n.trim().is_empty());
        match name {
            Some(explicit) => {
                fields.insert("name".to_string(), json!(explicit));
            }
            None if !has_name => {
                if let Some(stem) = name_from_filename(&file.filename) {
                    fields.insert("name".to_string(), json!(stem));
                }
            }
            None => {}
        }
        fields.insert("source".to_string(), json!(file.filename));
    }

    let saved = state.store.save_candidate(&record).await?;
    if let Value::Object(fields) = &mut record {
        fields.insert("id".to_string(), json!(saved.id));
    }

    Ok(ImportedResume {
        filename: file.filename,
        id: saved.id,
        candidate: normalize(&record, state.engine.config()),
    })
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(err.body_text())
    }
}
