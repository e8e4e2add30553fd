//! OpenAI chat completions adapter.
//!
//! Request: one user message whose content is the instruction text followed
//! by one `image_url` part per screenshot (base64 data URIs).
//! Response: `choices[0].message.content`, either a string or an array of
//! typed parts.

use serde::Deserialize;
use serde_json::json;
use snapsolve_core::types::{ImagePayload, ProviderId};
use snapsolve_core::SolveError;

use crate::extract::finish_text;
use crate::traits::{Endpoint, ProviderAdapter, ProviderRequest};

const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 4000;
const DISPLAY_NAME: &str = "OpenAI";

/// Adapter for `POST {base}/chat/completions`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenAiAdapter;

// ─────────────────────────────────────────────
// Response envelope
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn build(&self, endpoint: &Endpoint, instruction: &str, images: &[ImagePayload]) -> ProviderRequest {
        let mut content = Vec::with_capacity(images.len() + 1);
        content.push(json!({ "type": "text", "text": instruction }));
        content.extend(images.iter().map(|img| {
            json!({
                "type": "image_url",
                "image_url": { "url": img.data_url() }
            })
        }));

        ProviderRequest {
            url: format!("{}/chat/completions", endpoint.api_base),
            headers: vec![("Authorization", format!("Bearer {}", endpoint.api_key))],
            body: json!({
                "model": endpoint.model,
                "messages": [{ "role": "user", "content": content }],
                "temperature": TEMPERATURE,
                "max_tokens": MAX_TOKENS,
            }),
        }
    }

    fn extract(&self, raw: &serde_json::Value) -> Result<String, SolveError> {
        let completion: ChatCompletion = serde_json::from_value(raw.clone())
            .map_err(|e| SolveError::MalformedUpstream(format!("chat completion envelope: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SolveError::EmptyResponse {
                provider: DISPLAY_NAME.to_string(),
            })?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!(provider = DISPLAY_NAME, "response truncated at max_tokens");
        }

        let text = match choice.message.content {
            Some(MessageContent::Text(s)) => s,
            Some(MessageContent::Parts(parts)) => parts
                .into_iter()
                .filter(|p| p.kind == "text")
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join(""),
            None => String::new(),
        };

        finish_text(DISPLAY_NAME, &text)
    }
}
