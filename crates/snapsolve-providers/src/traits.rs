//! Provider traits — the seam between the pipeline and vendor protocols.
//!
//! Each vendor gets one [`ProviderAdapter`] (pure, synchronous: build a
//! request, extract text from a reply). [`VisionProvider`] is the async,
//! credentialed client the pipeline actually calls.

use async_trait::async_trait;
use snapsolve_core::types::{ImagePayload, ProviderId};
use snapsolve_core::SolveError;

/// Where and as whom a request is sent.
#[derive(Clone)]
pub struct Endpoint {
    /// API base URL without trailing slash (e.g. `"https://api.openai.com/v1"`).
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

/// A fully built HTTP request for one provider call.
#[derive(Clone, Debug)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

impl ProviderRequest {
    /// Look up a header value by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Vendor wire contract: request shape and response envelope.
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Build the multimodal request. Image order and sampling parameters are
    /// part of each vendor's contract.
    fn build(&self, endpoint: &Endpoint, instruction: &str, images: &[ImagePayload]) -> ProviderRequest;

    /// Reduce a raw reply envelope to the text the model produced.
    fn extract(&self, raw: &serde_json::Value) -> Result<String, SolveError>;
}

/// A credentialed client for one provider.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Send an instruction plus screenshots and return the normalized reply text.
    async fn complete(&self, instruction: &str, images: &[ImagePayload]) -> Result<String, SolveError>;

    fn provider(&self) -> ProviderId;

    /// The model this client sends requests to.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
