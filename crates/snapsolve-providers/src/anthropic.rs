//! Anthropic messages API adapter.
//!
//! Request: one user message whose content is a text block followed by one
//! base64 image block per screenshot, each tagged with its media type.
//! Response: every `text` content block, concatenated in order.

use serde::Deserialize;
use serde_json::json;
use snapsolve_core::types::{ImagePayload, ProviderId};
use snapsolve_core::SolveError;

use crate::extract::finish_text;
use crate::traits::{Endpoint, ProviderAdapter, ProviderRequest};

const API_VERSION: &str = "2023-06-01";
const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 4000;
const DISPLAY_NAME: &str = "Anthropic";

/// Adapter for `POST {base}/messages`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnthropicAdapter;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn build(&self, endpoint: &Endpoint, instruction: &str, images: &[ImagePayload]) -> ProviderRequest {
        let mut content = Vec::with_capacity(images.len() + 1);
        content.push(json!({ "type": "text", "text": instruction }));
        content.extend(images.iter().map(|img| {
            json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": img.media_type(),
                    "data": img.data,
                }
            })
        }));

        ProviderRequest {
            url: format!("{}/messages", endpoint.api_base),
            headers: vec![
                ("x-api-key", endpoint.api_key.clone()),
                ("anthropic-version", API_VERSION.to_string()),
            ],
            body: json!({
                "model": endpoint.model,
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
                "messages": [{ "role": "user", "content": content }],
            }),
        }
    }

    fn extract(&self, raw: &serde_json::Value) -> Result<String, SolveError> {
        let response: MessagesResponse = serde_json::from_value(raw.clone())
            .map_err(|e| SolveError::MalformedUpstream(format!("messages envelope: {e}")))?;

        if response.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!(provider = DISPLAY_NAME, "response truncated at max_tokens");
        }

        let text: String = response
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();

        finish_text(DISPLAY_NAME, &text)
    }
}
