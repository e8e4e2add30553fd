//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `PipelineConfig`, `ScreenshotsConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

use crate::types::{Credentials, ProviderId};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.snapsolve/config.json` + env vars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// The single active provider.
    pub api_provider: ProviderId,
    /// API key for the active provider.
    pub api_key: String,
    /// Preferred answer language, forwarded verbatim into prompts.
    pub language: String,
    pub providers: ProvidersConfig,
    pub pipeline: PipelineConfig,
    pub screenshots: ScreenshotsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_provider: ProviderId::OpenAi,
            api_key: String::new(),
            language: "python".to_string(),
            providers: ProvidersConfig::default(),
            pipeline: PipelineConfig::default(),
            screenshots: ScreenshotsConfig::default(),
        }
    }
}

impl Config {
    /// Settings block of the active provider.
    pub fn active_provider(&self) -> &ProviderConfig {
        self.providers.get(self.api_provider)
    }

    /// Credentials for the active provider.
    pub fn credentials(&self) -> Credentials {
        let provider = self.active_provider();
        Credentials {
            provider: self.api_provider,
            api_key: self.api_key.trim().to_string(),
            model: provider.model.clone().filter(|m| !m.trim().is_empty()),
            api_base: provider.api_base.clone().filter(|b| !b.trim().is_empty()),
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Per-provider overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// Model name (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Force the two-stage extract-then-solve protocol on or off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_protocol: Option<bool>,
}

/// One `ProviderConfig` per supported provider family.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,
    pub anthropic: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, id: ProviderId) -> &ProviderConfig {
        match id {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Gemini => &self.gemini,
            ProviderId::Anthropic => &self.anthropic,
        }
    }

    pub fn get_mut(&mut self, id: ProviderId) -> &mut ProviderConfig {
        match id {
            ProviderId::OpenAi => &mut self.openai,
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::Anthropic => &mut self.anthropic,
        }
    }
}

// ─────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────

/// Request lifecycle settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// HTTP timeout per provider call, in seconds.
    pub timeout_secs: u64,
    /// Capacity of the event channel towards the UI.
    pub event_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            event_buffer: 64,
        }
    }
}

// ─────────────────────────────────────────────
// Screenshots
// ─────────────────────────────────────────────

/// Where the screenshot queues live on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenshotsConfig {
    pub queue_dir: String,
    pub extra_queue_dir: String,
}

impl Default for ScreenshotsConfig {
    fn default() -> Self {
        Self {
            queue_dir: "~/.snapsolve/screenshots".to_string(),
            extra_queue_dir: "~/.snapsolve/extra_screenshots".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_provider, ProviderId::OpenAi);
        assert_eq!(config.language, "python");
        assert_eq!(config.pipeline.timeout_secs, 120);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_credentials_use_active_provider_overrides() {
        let mut config = Config::default();
        config.api_provider = ProviderId::Gemini;
        config.api_key = "  AIzaSyExample  ".to_string();
        config.providers.gemini.model = Some("gemini-1.5-pro".to_string());
        config.providers.openai.api_base = Some("https://proxy.example/v1".to_string());

        let creds = config.credentials();
        assert_eq!(creds.provider, ProviderId::Gemini);
        assert_eq!(creds.api_key, "AIzaSyExample");
        assert_eq!(creds.model.as_deref(), Some("gemini-1.5-pro"));
        // OpenAI's override must not leak into Gemini's credentials
        assert!(creds.api_base.is_none());
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut config = Config::default();
        config.providers.openai.model = Some("   ".to_string());
        config.providers.openai.api_base = Some(String::new());
        let creds = config.credentials();
        assert!(creds.model.is_none());
        assert!(creds.api_base.is_none());
    }

    #[test]
    fn test_camel_case_round_trip_keys() {
        let mut config = Config::default();
        config.providers.anthropic.api_base = Some("https://a.example".into());
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("apiProvider").is_some());
        assert!(value["providers"]["anthropic"].get("apiBase").is_some());
        assert!(value["pipeline"].get("timeoutSecs").is_some());
    }
}
