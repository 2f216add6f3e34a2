use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::latex::CompileError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Clients get the status code and the display text as a plain-text body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("AI Generation failed: {0}")]
    Generation(#[source] LlmError),

    #[error("AI Conversion failed: {0}")]
    Conversion(#[source] LlmError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {rejection}");
        AppError::BadRequest("Invalid request body".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // The compiler already logged its output.
            AppError::Compile(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Generation(e) | AppError::Conversion(e) => {
                tracing::error!("LLM error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
