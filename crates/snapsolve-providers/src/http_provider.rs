//! reqwest-backed [`VisionProvider`] shared by all three vendors.
//!
//! The vendor-specific parts (URL, headers, body, reply envelope) come from
//! the [`ProviderAdapter`]; this file owns transport, status mapping and
//! logging. Request URLs are never logged because Gemini carries the key in
//! the query string.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error};

use snapsolve_core::types::{Credentials, ImagePayload, ProviderId};
use snapsolve_core::SolveError;

use crate::registry::{adapter_for, spec_for, ProviderSpec};
use crate::traits::{Endpoint, ProviderAdapter, VisionProvider};

/// Upstream bodies are clipped to this many chars before they land in an error.
const ERROR_BODY_LIMIT: usize = 300;

// ─────────────────────────────────────────────
// HttpVisionProvider
// ─────────────────────────────────────────────

/// A credentialed client for one provider, talking HTTP via `reqwest`.
pub struct HttpVisionProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    endpoint: Endpoint,
    spec: &'static ProviderSpec,
    adapter: &'static dyn ProviderAdapter,
}

impl std::fmt::Debug for HttpVisionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpVisionProvider")
            .field("provider", &self.spec.display_name)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpVisionProvider {
    /// Build a client from credentials. The key shape is not checked here;
    /// [`crate::ClientRegistry`] does that before calling in.
    pub fn new(credentials: &Credentials, timeout: Duration) -> Result<Self, SolveError> {
        let spec = spec_for(credentials.provider);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SolveError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: spec.endpoint(credentials),
            spec,
            adapter: adapter_for(credentials.provider),
        })
    }

    fn provider_name(&self) -> String {
        self.spec.display_name.to_string()
    }
}

#[async_trait]
impl VisionProvider for HttpVisionProvider {
    async fn complete(&self, instruction: &str, images: &[ImagePayload]) -> Result<String, SolveError> {
        let request = self.adapter.build(&self.endpoint, instruction, images);

        debug!(
            provider = self.spec.display_name,
            model = %self.endpoint.model,
            images = images.len(),
            prompt_chars = instruction.len(),
            "Calling vision model"
        );

        let mut builder = self.client.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await.map_err(|e| {
            // reqwest embeds the URL in its Display; strip it.
            let e = e.without_url();
            error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
            SolveError::Request(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SolveError::Request(e.without_url().to_string()))?;

        if !status.is_success() {
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %clip(&body),
                "API error"
            );
            return Err(map_status(&self.provider_name(), status, &body));
        }

        let raw: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            error!(provider = self.spec.display_name, error = %e, "Failed to parse response body");
            SolveError::MalformedUpstream(format!("response is not JSON: {e}"))
        })?;

        let text = self.adapter.extract(&raw)?;
        debug!(
            provider = self.spec.display_name,
            chars = text.len(),
            "Vision model response received"
        );
        Ok(text)
    }

    fn provider(&self) -> ProviderId {
        self.spec.id
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Status mapping
// ─────────────────────────────────────────────

/// Map a non-2xx reply to an error kind. The body is consulted for quota and
/// oversize hints that vendors put in otherwise generic statuses.
pub fn map_status(provider: &str, status: StatusCode, body: &str) -> SolveError {
    let lower = body.to_ascii_lowercase();
    let provider = provider.to_string();

    if status == StatusCode::PAYLOAD_TOO_LARGE
        || lower.contains("prompt is too long")
        || lower.contains("request_too_large")
    {
        return SolveError::PayloadTooLarge { provider };
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SolveError::AuthFailed {
            provider,
            message: format!("HTTP {}", status.as_u16()),
        },
        StatusCode::TOO_MANY_REQUESTS => {
            if lower.contains("quota")
                || lower.contains("insufficient_quota")
                || lower.contains("resource_exhausted")
            {
                SolveError::QuotaExceeded { provider }
            } else {
                SolveError::RateLimited { provider }
            }
        }
        _ => SolveError::Upstream {
            provider,
            message: clip(body),
            status: Some(status.as_u16()),
        },
    }
}

fn clip(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_LIMIT {
        body.to_string()
    } else {
        let head: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{head}…")
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds(provider: ProviderId, key: &str, base: &str) -> Credentials {
        let mut c = Credentials::new(provider, key);
        c.api_base = Some(base.to_string());
        c
    }

    fn client(provider: ProviderId, key: &str, base: &str) -> HttpVisionProvider {
        HttpVisionProvider::new(&creds(provider, key, base), Duration::from_secs(5)).unwrap()
    }

    fn png() -> Vec<ImagePayload> {
        vec![ImagePayload::new("/tmp/shot.png", "iVBORw0KGgo")]
    }

    // ── Unit tests ──

    #[test]
    fn test_map_status_auth() {
        for code in [401u16, 403] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = map_status("OpenAI", status, "{}");
            assert!(matches!(err, SolveError::AuthFailed { .. }));
            assert!(err.is_credential_error());
        }
    }

    #[test]
    fn test_map_status_rate_limit_vs_quota() {
        let err = map_status("OpenAI", StatusCode::TOO_MANY_REQUESTS, r#"{"error":{"message":"slow down"}}"#);
        assert!(matches!(err, SolveError::RateLimited { .. }));

        let err = map_status(
            "OpenAI",
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":"insufficient_quota"}}"#,
        );
        assert!(matches!(err, SolveError::QuotaExceeded { .. }));

        let err = map_status("Gemini", StatusCode::TOO_MANY_REQUESTS, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#);
        assert!(matches!(err, SolveError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_map_status_payload_too_large() {
        assert!(matches!(
            map_status("Anthropic", StatusCode::PAYLOAD_TOO_LARGE, ""),
            SolveError::PayloadTooLarge { .. }
        ));
        assert!(matches!(
            map_status(
                "Anthropic",
                StatusCode::BAD_REQUEST,
                r#"{"error":{"message":"prompt is too long: 210000 tokens"}}"#
            ),
            SolveError::PayloadTooLarge { .. }
        ));
    }

    #[test]
    fn test_map_status_other_is_upstream() {
        let err = map_status("Gemini", StatusCode::INTERNAL_SERVER_ERROR, "boom");
        match err {
            SolveError::Upstream { status, message, .. } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_clip_long_body() {
        let long = "x".repeat(1000);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), ERROR_BODY_LIMIT + 1);
    }

    #[test]
    fn test_debug_hides_key() {
        let c = client(ProviderId::OpenAi, "sk-secret-value", "http://localhost");
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret-value"));
        assert!(dbg.contains("OpenAI"));
    }

    #[test]
    fn test_model_defaults_from_spec() {
        let c = client(ProviderId::Gemini, "AIzaSyExampleKey", "http://localhost");
        assert_eq!(c.model(), "gemini-2.0-flash");
        assert_eq!(c.display_name(), "Gemini");
        assert_eq!(VisionProvider::provider(&c), ProviderId::Gemini);
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn test_openai_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test-key"))
            .and(body_partial_json(json!({ "model": "gpt-4o", "max_tokens": 4000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "```python\nprint(1)\n```" }, "finish_reason": "stop" }]
            })))
            .mount(&server)
            .await;

        let c = client(ProviderId::OpenAi, "sk-test-key", &server.uri());
        let text = c.complete("Solve", &png()).await.unwrap();
        assert_eq!(text, "```python\nprint(1)\n```");
    }

    #[tokio::test]
    async fn test_gemini_key_in_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "AIzaSyExampleKey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Final answer: A" }] }, "finishReason": "STOP" }]
            })))
            .mount(&server)
            .await;

        let c = client(ProviderId::Gemini, "AIzaSyExampleKey", &server.uri());
        assert_eq!(c.complete("Solve", &png()).await.unwrap(), "Final answer: A");
    }

    #[tokio::test]
    async fn test_anthropic_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "Analysis text" }],
                "stop_reason": "end_turn"
            })))
            .mount(&server)
            .await;

        let c = client(ProviderId::Anthropic, "sk-ant-test", &server.uri());
        assert_eq!(c.complete("Explain", &png()).await.unwrap(), "Analysis text");
    }

    #[tokio::test]
    async fn test_http_429_quota() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "You exceeded your current quota", "type": "insufficient_quota" }
            })))
            .mount(&server)
            .await;

        let c = client(ProviderId::OpenAi, "sk-test", &server.uri());
        let err = c.complete("Solve", &png()).await.unwrap_err();
        assert!(matches!(err, SolveError::QuotaExceeded { .. }));
        assert!(!err.user_message().contains("exceeded your current quota"));
    }

    #[tokio::test]
    async fn test_http_401_is_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": { "type": "authentication_error", "message": "invalid x-api-key" }
            })))
            .mount(&server)
            .await;

        let c = client(ProviderId::Anthropic, "sk-ant-bad", &server.uri());
        let err = c.complete("Solve", &png()).await.unwrap_err();
        assert!(matches!(err, SolveError::AuthFailed { .. }));
    }

    #[tokio::test]
    async fn test_http_413_payload_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(413).set_body_string("request_too_large"))
            .mount(&server)
            .await;

        let c = client(ProviderId::Anthropic, "sk-ant-test", &server.uri());
        let err = c.complete("Solve", &png()).await.unwrap_err();
        assert!(matches!(err, SolveError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let c = client(ProviderId::OpenAi, "sk-test", &server.uri());
        let err = c.complete("Solve", &png()).await.unwrap_err();
        assert!(matches!(err, SolveError::MalformedUpstream(_)));
    }

    #[tokio::test]
    async fn test_network_error() {
        let c = client(ProviderId::Gemini, "AIzaSyExampleKey", "http://127.0.0.1:1");
        let err = c.complete("Solve", &png()).await.unwrap_err();
        assert!(matches!(err, SolveError::Request(_)));
        // The key travels in the URL and must not leak into the error.
        assert!(!err.to_string().contains("AIzaSyExampleKey"));
    }
}
