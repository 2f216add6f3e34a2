//! Document extraction: recovers LaTeX source from free-form model output.
//!
//! Models are asked for bare LaTeX but often add commentary or wrap the answer
//! in markdown code fences. Policy, first match wins:
//! 1. Anchored span: first `\documentclass` through the last `\end{document}`.
//! 2. Fence stripping: drop the opening fence line and the closing fence, then
//!    every leftover fence marker. If that reveals a valid anchored span, the
//!    span is returned instead.
//!
//! `extract_document(extract_document(x)) == extract_document(x)` for all `x`.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DOCUMENT_START: &str = "\\documentclass";
pub const DOCUMENT_END: &str = "\\end{document}";

const FENCE: &str = "```";
/// Language tags a model may put on the opening fence.
const FENCE_TAGS: &[&str] = &["latex", "tex"];

static FENCE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:(?:latex|tex)\b)?").expect("fence marker pattern is valid")
});

/// Returns the best-effort LaTeX document contained in `raw`. Never fails;
/// the result may be empty.
pub fn extract_document(raw: &str) -> String {
    if let Some(document) = anchored_span(raw) {
        return document.to_string();
    }

    let stripped = strip_fences(raw);
    match anchored_span(&stripped) {
        Some(document) => document.to_string(),
        None => stripped,
    }
}

/// Slice from the first start anchor through the end of the last end anchor.
fn anchored_span(text: &str) -> Option<&str> {
    let start = text.find(DOCUMENT_START)?;
    let end = text.rfind(DOCUMENT_END)?;
    (end > start).then(|| &text[start..end + DOCUMENT_END.len()])
}

fn strip_fences(text: &str) -> String {
    let mut body = text;

    if let Some(rest) = strip_opening_fence(body.trim_start()) {
        body = rest;
    }
    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
    }

    // A single pass can splice two backtick runs into a new marker.
    let mut cleaned = body.to_string();
    while cleaned.contains(FENCE) {
        cleaned = FENCE_MARKER.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}

/// Strips "```", an optional language tag, and the line break that ends the
/// fence line.
fn strip_opening_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FENCE)?;
    let rest = FENCE_TAGS
        .iter()
        .find_map(|tag| {
            rest.strip_prefix(tag)
                .filter(|after| !after.starts_with(|c: char| c.is_ascii_alphanumeric()))
        })
        .unwrap_or(rest);

    Some(
        rest.strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
            .unwrap_or(rest),
    )
}
