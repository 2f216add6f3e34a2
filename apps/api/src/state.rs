use std::sync::Arc;

use crate::latex::ArtifactRenderer;
use crate::resume::writer::ResumeWriter;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; every handler call is independent.
#[derive(Clone)]
pub struct AppState {
    pub writer: ResumeWriter,
    /// Pluggable renderer. Default: `LatexCompiler` shelling out to pdflatex.
    pub renderer: Arc<dyn ArtifactRenderer>,
}
