//! Error taxonomy for the provider and pipeline layers.
//!
//! Every network or parse failure is converted into one of these kinds
//! before it reaches the UI boundary. `user_message()` is the only text
//! that may be shown to a user; it never includes upstream bodies or URLs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("provider {provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("authentication failed for {provider}: {message}")]
    AuthFailed { provider: String, message: String },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("quota exceeded for {provider}")]
    QuotaExceeded { provider: String },

    #[error("payload too large for {provider}")]
    PayloadTooLarge { provider: String },

    #[error("request canceled")]
    Canceled,

    #[error("malformed upstream output: {0}")]
    MalformedUpstream(String),

    #[error("upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("request error: {0}")]
    Request(String),

    #[error("no screenshots to process")]
    NoInput,

    #[error("no problem context: run a solve first")]
    NoContext,
}

impl SolveError {
    /// Extract provider name from structured error variants.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::NotConfigured { provider, .. }
            | Self::AuthFailed { provider, .. }
            | Self::EmptyResponse { provider }
            | Self::RateLimited { provider }
            | Self::QuotaExceeded { provider }
            | Self::PayloadTooLarge { provider }
            | Self::Upstream { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Credential-shaped failures get a "fix your settings" signal instead of
    /// a generic error.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::NotConfigured { .. } | Self::AuthFailed { .. })
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Sanitized message safe to show in the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured { provider, reason } => {
                format!("{provider} is not configured ({reason}). Open settings to add a valid API key.")
            }
            Self::AuthFailed { provider, .. } => {
                format!("{provider} rejected the API key. Open settings to update it.")
            }
            Self::EmptyResponse { provider } => {
                format!("{provider} returned an empty response. Try again.")
            }
            Self::RateLimited { provider } => {
                format!("Rate limited by {provider}. Wait a moment and try again.")
            }
            Self::QuotaExceeded { provider } => {
                format!("{provider} quota exceeded. Wait for the quota to reset or check your plan.")
            }
            Self::PayloadTooLarge { provider } => {
                format!(
                    "The screenshots are too large for {provider}. Remove some screenshots or switch to a provider with a larger context."
                )
            }
            Self::Canceled => "Request canceled.".to_string(),
            Self::MalformedUpstream(_) => {
                "Could not understand the model's response. Try again.".to_string()
            }
            Self::Upstream {
                provider, status, ..
            } => match status {
                Some(code) => format!("{provider} returned an error (HTTP {code})."),
                None => format!("{provider} returned an unexpected response."),
            },
            Self::Request(_) => "Request to the provider failed. Check your connection.".to_string(),
            Self::NoInput => "No screenshots to process.".to_string(),
            Self::NoContext => {
                "No problem context: solve the problem before debugging.".to_string()
            }
        }
    }
}
