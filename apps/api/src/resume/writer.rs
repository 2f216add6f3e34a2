//! Resume Writer: turns instructions or uploaded files into LaTeX via the model.
//!
//! Every reply is reduced to its text and passed through `extract_document`
//! before it reaches the caller.

use std::sync::Arc;

use tracing::info;

use crate::latex::extract_document;
use crate::llm_client::prompts::{CONVERSION_PROMPT, PRIOR_DOCUMENT_PREAMBLE, RESUME_SYSTEM};
use crate::llm_client::{GenerateContentRequest, GenerativeBackend, LlmError, Part};

/// The backend is injected at construction; nothing here reaches for globals.
#[derive(Clone)]
pub struct ResumeWriter {
    backend: Arc<dyn GenerativeBackend>,
}

impl ResumeWriter {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Writes or revises a resume. A blank `prior_document` counts as none.
    pub async fn generate(
        &self,
        instruction: &str,
        prior_document: Option<&str>,
    ) -> Result<String, LlmError> {
        let mut parts = Vec::with_capacity(2);
        if let Some(prior) = prior_document.filter(|doc| !doc.trim().is_empty()) {
            parts.push(Part::text(format!("{PRIOR_DOCUMENT_PREAMBLE}\n\n{prior}")));
        }
        parts.push(Part::text(instruction));

        self.complete(parts).await
    }

    /// Rebuilds an uploaded resume (PDF, image, ...) as LaTeX.
    pub async fn convert(&self, file: &[u8], mime_type: &str) -> Result<String, LlmError> {
        info!(
            "Converting uploaded document: mime={mime_type}, bytes={}",
            file.len()
        );
        let parts = vec![Part::text(CONVERSION_PROMPT), Part::inline(mime_type, file)];

        self.complete(parts).await
    }

    async fn complete(&self, parts: Vec<Part>) -> Result<String, LlmError> {
        let request = GenerateContentRequest::new(RESUME_SYSTEM, parts);
        let response = self.backend.generate_content(&request).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;

        Ok(extract_document(&text))
    }
}
