// Resume API: generation from prompts, conversion of uploads, and PDF compilation.
// All model calls go through llm_client via ResumeWriter.

pub mod handlers;
pub mod writer;
