//! Provider registry — static specs for the three supported provider families.
//!
//! Each `ProviderSpec` describes how to reach a provider: default model and
//! endpoint, the API-key shape check, and whether the provider speaks the
//! two-stage extract-then-solve protocol by default.

use regex::Regex;
use snapsolve_core::types::{Credentials, ProviderId};

use crate::anthropic::AnthropicAdapter;
use crate::gemini::GeminiAdapter;
use crate::openai::OpenAiAdapter;
use crate::traits::{Endpoint, ProviderAdapter};

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// How an API key is sanity-checked before a client is built.
#[derive(Clone, Debug)]
pub enum KeyCheck {
    /// Key must match this regular expression.
    Pattern(&'static str),
    /// Key must be at least this many characters with no whitespace.
    MinLength(usize),
}

/// Static specification describing one provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub id: ProviderId,
    /// Human-readable name for logs and UI. E.g. `"OpenAI"`.
    pub display_name: &'static str,
    /// Model used when the config has no override.
    pub default_model: &'static str,
    /// API base used when the config has no override.
    pub default_api_base: &'static str,
    pub key_check: KeyCheck,
    /// Whether solve runs use the two-stage protocol (JSON extraction, then
    /// a sectioned solution) unless the config says otherwise.
    pub structured_protocol: bool,
}

/// Complete list of supported provider specifications.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        id: ProviderId::OpenAi,
        display_name: "OpenAI",
        default_model: "gpt-4o",
        default_api_base: "https://api.openai.com/v1",
        key_check: KeyCheck::Pattern(r"^sk-[A-Za-z0-9_-]{20,}$"),
        structured_protocol: true,
    },
    ProviderSpec {
        id: ProviderId::Gemini,
        display_name: "Gemini",
        default_model: "gemini-2.0-flash",
        default_api_base: "https://generativelanguage.googleapis.com/v1beta",
        key_check: KeyCheck::MinLength(10),
        structured_protocol: false,
    },
    ProviderSpec {
        id: ProviderId::Anthropic,
        display_name: "Anthropic",
        default_model: "claude-3-7-sonnet-20250219",
        default_api_base: "https://api.anthropic.com/v1",
        key_check: KeyCheck::Pattern(r"^sk-ant-[A-Za-z0-9_-]{20,}$"),
        structured_protocol: true,
    },
];

static OPENAI: OpenAiAdapter = OpenAiAdapter;
static GEMINI: GeminiAdapter = GeminiAdapter;
static ANTHROPIC: AnthropicAdapter = AnthropicAdapter;

// ─────────────────────────────────────────────
// Lookup functions
// ─────────────────────────────────────────────

/// The spec for a provider identity.
pub fn spec_for(id: ProviderId) -> &'static ProviderSpec {
    match id {
        ProviderId::OpenAi => &PROVIDERS[0],
        ProviderId::Gemini => &PROVIDERS[1],
        ProviderId::Anthropic => &PROVIDERS[2],
    }
}

/// The wire adapter for a provider identity.
pub fn adapter_for(id: ProviderId) -> &'static dyn ProviderAdapter {
    match id {
        ProviderId::OpenAi => &OPENAI,
        ProviderId::Gemini => &GEMINI,
        ProviderId::Anthropic => &ANTHROPIC,
    }
}

impl ProviderSpec {
    /// Check the API key's shape. Returns a human-readable reason on failure.
    pub fn validate_api_key(&self, key: &str) -> Result<(), String> {
        let key = key.trim();
        if key.is_empty() {
            return Err("missing API key".to_string());
        }
        match &self.key_check {
            KeyCheck::Pattern(pattern) => {
                let matches = Regex::new(pattern)
                    .map(|re| re.is_match(key))
                    .unwrap_or(false);
                if matches {
                    Ok(())
                } else {
                    Err(format!("API key does not look like a {} key", self.display_name))
                }
            }
            KeyCheck::MinLength(min) => {
                if key.chars().count() >= *min && !key.chars().any(char::is_whitespace) {
                    Ok(())
                } else {
                    Err(format!("API key does not look like a {} key", self.display_name))
                }
            }
        }
    }

    /// Resolve the endpoint for a request: config override > spec default.
    pub fn endpoint(&self, credentials: &Credentials) -> Endpoint {
        let api_base = credentials
            .api_base
            .as_deref()
            .unwrap_or(self.default_api_base)
            .trim_end_matches('/')
            .to_string();
        let model = credentials
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.to_string());
        Endpoint {
            api_base,
            api_key: credentials.api_key.trim().to_string(),
            model,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
