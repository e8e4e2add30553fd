//! Gemini `generateContent` adapter.
//!
//! Request: one `user` content entry whose parts are the screenshots
//! (`inlineData`) followed by the instruction text last. The API key travels
//! as the `key` query parameter, not a header.
//! Response: the first candidate's text parts. A candidate cut off at the
//! output-token limit is accepted with whatever text it has.

use serde::Deserialize;
use serde_json::json;
use snapsolve_core::types::{ImagePayload, ProviderId};
use snapsolve_core::SolveError;
use tracing::warn;

use crate::extract::{finish_text, strip_wrapper_fence};
use crate::traits::{Endpoint, ProviderAdapter, ProviderRequest};

const TEMPERATURE: f64 = 0.2;
const TOP_P: f64 = 0.9;
const MAX_OUTPUT_TOKENS: u32 = 8192;
const TRUNCATED: &str = "MAX_TOKENS";
const DISPLAY_NAME: &str = "Gemini";

/// Adapter for `POST {base}/models/{model}:generateContent?key=…`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeminiAdapter;

// ─────────────────────────────────────────────
// Response envelope
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn build(&self, endpoint: &Endpoint, instruction: &str, images: &[ImagePayload]) -> ProviderRequest {
        let mut parts: Vec<serde_json::Value> = images
            .iter()
            .map(|img| {
                json!({
                    "inlineData": {
                        "mimeType": img.media_type(),
                        "data": img.data,
                    }
                })
            })
            .collect();
        parts.push(json!({ "text": instruction }));

        ProviderRequest {
            url: format!(
                "{}/models/{}:generateContent?key={}",
                endpoint.api_base, endpoint.model, endpoint.api_key
            ),
            headers: Vec::new(),
            body: json!({
                "contents": [{ "role": "user", "parts": parts }],
                "generationConfig": {
                    "temperature": TEMPERATURE,
                    "topP": TOP_P,
                    "maxOutputTokens": MAX_OUTPUT_TOKENS,
                }
            }),
        }
    }

    fn extract(&self, raw: &serde_json::Value) -> Result<String, SolveError> {
        let response: GenerateContentResponse = serde_json::from_value(raw.clone())
            .map_err(|e| SolveError::MalformedUpstream(format!("generateContent envelope: {e}")))?;

        let empty = || SolveError::EmptyResponse {
            provider: DISPLAY_NAME.to_string(),
        };

        let candidate = response.candidates.into_iter().next().ok_or_else(empty)?;
        let truncated = candidate.finish_reason.as_deref() == Some(TRUNCATED);
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        let text: String = parts.into_iter().filter_map(|p| p.text).collect();

        if truncated {
            // Partial output is still useful to the classifier.
            warn!(provider = DISPLAY_NAME, chars = text.len(), "response truncated at maxOutputTokens");
            return Ok(strip_wrapper_fence(&text).trim().to_string());
        }

        if text.is_empty() {
            return Err(empty());
        }
        finish_text(DISPLAY_NAME, &text)
    }
}
