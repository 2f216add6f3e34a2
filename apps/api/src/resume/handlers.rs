//! Axum route handlers for the Resume API.

use axum::{
    extract::{multipart::MultipartRejection, FromRequest, Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::state::AppState;

/// Largest accepted resume file.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Request body limit for the upload route: the file plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

const UPLOAD_FIELD: &str = "resume";
const GENERIC_MIME: &str = "application/octet-stream";
const INVALID_MULTIPART: &str = "File too large or invalid multipart";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// `Json` whose rejections become `AppError::BadRequest`.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct CompileRequest {
    #[serde(default)]
    pub latex_code: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub current_latex: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LatexResponse {
    pub latex: String,
}

/// An uploaded resume, bounded by `MAX_UPLOAD_BYTES`.
#[derive(Debug)]
pub struct ConversionRequest {
    pub file_bytes: Bytes,
    pub mime_type: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/compile
///
/// Compiles LaTeX source and returns the PDF bytes.
pub async fn handle_compile(
    State(state): State<AppState>,
    AppJson(request): AppJson<CompileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pdf = state.renderer.render(&request.latex_code).await?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], pdf))
}

/// POST /api/v1/resume/generate
///
/// Writes a new resume or revises `current_latex` according to `prompt`.
pub async fn handle_generate(
    State(state): State<AppState>,
    AppJson(request): AppJson<GenerateRequest>,
) -> Result<Json<LatexResponse>, AppError> {
    let latex = state
        .writer
        .generate(&request.prompt, request.current_latex.as_deref())
        .await
        .map_err(AppError::Generation)?;

    Ok(Json(LatexResponse { latex }))
}

/// POST /api/v1/resume/upload
///
/// Multipart upload; the `resume` field holds a PDF or image that is rebuilt as LaTeX.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LatexResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Upload rejected: {e}");
        AppError::BadRequest(INVALID_MULTIPART.to_string())
    })?;

    let upload = read_resume_field(&mut multipart).await?;

    let latex = state
        .writer
        .convert(&upload.file_bytes, &upload.mime_type)
        .await
        .map_err(AppError::Conversion)?;

    info!("Upload converted to {} bytes of LaTeX", latex.len());
    Ok(Json(LatexResponse { latex }))
}

async fn read_resume_field(multipart: &mut Multipart) -> Result<ConversionRequest, AppError> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        warn!("Error parsing multipart form: {e}");
        AppError::BadRequest(INVALID_MULTIPART.to_string())
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(String::from);
        let declared = field.content_type().map(String::from);
        let file_bytes = field.bytes().await.map_err(invalid)?;

        if file_bytes.len() > MAX_UPLOAD_BYTES {
            warn!("Upload of {} bytes exceeds the limit", file_bytes.len());
            return Err(AppError::BadRequest(INVALID_MULTIPART.to_string()));
        }

        let mime_type = resolve_mime(declared.as_deref(), file_name.as_deref(), &file_bytes);
        info!(
            "File uploaded: {:?}, size: {}, declared: {:?}, using: {}",
            file_name,
            file_bytes.len(),
            declared,
            mime_type
        );

        return Ok(ConversionRequest {
            file_bytes,
            mime_type,
        });
    }

    Err(AppError::BadRequest(format!(
        "Failed to get file '{UPLOAD_FIELD}'"
    )))
}

/// Declared type first; a generic or missing one falls back to the file's
/// magic bytes, then its extension.
fn resolve_mime(declared: Option<&str>, file_name: Option<&str>, bytes: &[u8]) -> String {
    declared
        .map(str::trim)
        .filter(|mime| !mime.is_empty() && *mime != GENERIC_MIME)
        .or_else(|| sniff_mime(bytes))
        .or_else(|| file_name.and_then(|name| mime_guess::from_path(name).first_raw()))
        .unwrap_or(GENERIC_MIME)
        .to_string()
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"%PDF-", "application/pdf"),
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF8", "image/gif"),
    ];

    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
}
