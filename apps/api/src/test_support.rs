//! Scripted stand-ins for the model backend and the compiler.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::latex::{ArtifactRenderer, CompileError};
use crate::llm_client::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerativeBackend,
    LlmError, Part,
};

pub enum Reply {
    /// One candidate with these text parts.
    Parts(Vec<String>),
    NoCandidates,
    /// One candidate with an empty part list.
    NoParts,
    ApiError(u16, &'static str),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Parts(vec![text.to_string()])
    }
}

/// Answers every call with the same scripted reply and records each request.
pub struct FakeBackend {
    reply: Reply,
    requests: Mutex<Vec<GenerateContentRequest>>,
}

impl FakeBackend {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests_seen(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> GenerateContentRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend was never called")
    }
}

#[async_trait]
impl GenerativeBackend for FakeBackend {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        let candidate = |parts: Vec<Part>| Candidate {
            content: Content {
                role: Some("model".to_string()),
                parts,
            },
            finish_reason: Some("STOP".to_string()),
        };

        match &self.reply {
            Reply::Parts(texts) => Ok(GenerateContentResponse {
                candidates: vec![candidate(texts.iter().map(Part::text).collect())],
                ..Default::default()
            }),
            Reply::NoCandidates => Ok(GenerateContentResponse::default()),
            Reply::NoParts => Ok(GenerateContentResponse {
                candidates: vec![candidate(Vec::new())],
                ..Default::default()
            }),
            Reply::ApiError(status, message) => Err(LlmError::Api {
                status: *status,
                message: message.to_string(),
            }),
        }
    }
}

pub enum FakeRenderer {
    Pdf(&'static [u8]),
    CompilerLog(&'static str),
    Panic,
}

#[async_trait]
impl ArtifactRenderer for FakeRenderer {
    async fn render(&self, source: &str) -> Result<Vec<u8>, CompileError> {
        match self {
            FakeRenderer::Pdf(bytes) => Ok(bytes.to_vec()),
            FakeRenderer::CompilerLog(log) => Err(CompileError::Failed {
                program: "pdflatex".to_string(),
                status: "exit status: 1".to_string(),
                log: log.to_string(),
            }),
            FakeRenderer::Panic => panic!("renderer exploded on {} bytes", source.len()),
        }
    }
}
