//! Envelope-independent text cleanup shared by every adapter.
//!
//! Models often wrap a whole reply in a fence (```` ```json ````,
//! ```` ```markdown ````) that carries no meaning. Such wrappers are removed
//! here; fences tagged with a programming language are kept because they
//! delimit the actual code answer.

use std::sync::LazyLock;

use regex::Regex;
use snapsolve_core::SolveError;

/// Fence tags that only ever wrap a reply.
const WRAPPER_TAGS: &[&str] = &["json", "markdown", "md", "text", "txt", "plaintext"];

static WRAPPER_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*```[ \t]*([A-Za-z0-9_+#.-]*)[ \t]*\r?\n(.*?)\r?\n?[ \t]*```\s*\z")
        .expect("wrapper fence regex")
});

/// Strip a fence that wraps the entire reply, if it is a wrapper.
pub fn strip_wrapper_fence(text: &str) -> &str {
    let Some(caps) = WRAPPER_FENCE.captures(text) else {
        return text;
    };
    let tag = caps.get(1).map_or("", |m| m.as_str()).to_lowercase();
    let body = caps.get(2).map_or("", |m| m.as_str());

    let is_wrapper = WRAPPER_TAGS.contains(&tag.as_str())
        || (tag.is_empty() && matches!(body.trim_start().chars().next(), Some('{') | Some('[')));

    if is_wrapper {
        body
    } else {
        text
    }
}

/// Final step of every extractor: reject blank output, drop wrapper fences, trim.
pub fn finish_text(provider: &str, text: &str) -> Result<String, SolveError> {
    if text.trim().is_empty() {
        return Err(SolveError::EmptyResponse {
            provider: provider.to_string(),
        });
    }
    Ok(strip_wrapper_fence(text).trim().to_string())
}
