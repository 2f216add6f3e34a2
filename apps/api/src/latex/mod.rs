// LaTeX handling: pulling documents out of model output and compiling them to PDF.

pub mod compiler;
pub mod extract;

pub use compiler::{ArtifactRenderer, CompileError, CompilerSettings, LatexCompiler};
pub use extract::extract_document;
