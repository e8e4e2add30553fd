//! Config loader — reads `~/.snapsolve/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.snapsolve/config.json`
//! 3. Environment variables `SNAPSOLVE_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;
use crate::types::ProviderId;

/// Keys older configs used for per-stage model names, in preference order.
const LEGACY_MODEL_KEYS: &[&str] = &["solutionModel", "extractionModel", "debuggingModel"];

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    // Parse JSON → Value first for migration
    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// - `apiProvider` aliases (`"claude"`, `"google"`) → canonical names.
/// - Per-stage model keys (`solutionModel`, `extractionModel`,
///   `debuggingModel`) → `providers.<active>.model`, unless already set.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };

    let provider = match root.get("apiProvider").and_then(|v| v.as_str()) {
        Some(name) => match name.parse::<ProviderId>() {
            Ok(id) => id,
            Err(e) => {
                warn!("{e}, falling back to openai");
                ProviderId::OpenAi
            }
        },
        None => ProviderId::OpenAi,
    };
    root.insert(
        "apiProvider".to_string(),
        serde_json::Value::String(provider.as_str().to_string()),
    );

    let legacy_model = LEGACY_MODEL_KEYS
        .iter()
        .filter_map(|key| root.get(*key).and_then(|v| v.as_str()).map(String::from))
        .find(|m| !m.trim().is_empty());
    for key in LEGACY_MODEL_KEYS {
        root.remove(*key);
    }

    if let Some(model) = legacy_model {
        let providers = root
            .entry("providers")
            .or_insert_with(|| serde_json::json!({}));
        if let Some(providers) = providers.as_object_mut() {
            let entry = providers
                .entry(provider.as_str())
                .or_insert_with(|| serde_json::json!({}));
            if let Some(entry) = entry.as_object_mut() {
                if entry.get("model").is_none() {
                    debug!(provider = %provider, model = %model, "Migrated legacy model key");
                    entry.insert("model".to_string(), serde_json::Value::String(model));
                }
            }
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `SNAPSOLVE_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `SNAPSOLVE_API_KEY` → `api_key`
/// - `SNAPSOLVE_API_PROVIDER` → `api_provider`
/// - `SNAPSOLVE_LANGUAGE` → `language`
/// - `SNAPSOLVE_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `SNAPSOLVE_PROVIDERS__<NAME>__MODEL` → `providers.<name>.model`
/// - `SNAPSOLVE_PIPELINE__TIMEOUT_SECS` → `pipeline.timeout_secs`
/// - `SNAPSOLVE_SCREENSHOTS__QUEUE_DIR` → `screenshots.queue_dir`
/// - `SNAPSOLVE_SCREENSHOTS__EXTRA_QUEUE_DIR` → `screenshots.extra_queue_dir`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("SNAPSOLVE_API_KEY") {
        config.api_key = val;
    }
    if let Ok(val) = std::env::var("SNAPSOLVE_API_PROVIDER") {
        match val.parse::<ProviderId>() {
            Ok(id) => config.api_provider = id,
            Err(e) => warn!("Ignoring SNAPSOLVE_API_PROVIDER: {e}"),
        }
    }
    if let Ok(val) = std::env::var("SNAPSOLVE_LANGUAGE") {
        config.language = val;
    }

    for id in ProviderId::ALL {
        let name = id.as_str().to_uppercase();
        let provider = config.providers.get_mut(id);
        if let Ok(val) = std::env::var(format!("SNAPSOLVE_PROVIDERS__{name}__API_BASE")) {
            provider.api_base = Some(val);
        }
        if let Ok(val) = std::env::var(format!("SNAPSOLVE_PROVIDERS__{name}__MODEL")) {
            provider.model = Some(val);
        }
    }

    if let Ok(val) = std::env::var("SNAPSOLVE_PIPELINE__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.pipeline.timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("SNAPSOLVE_SCREENSHOTS__QUEUE_DIR") {
        config.screenshots.queue_dir = val;
    }
    if let Ok(val) = std::env::var("SNAPSOLVE_SCREENSHOTS__EXTRA_QUEUE_DIR") {
        config.screenshots.extra_queue_dir = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
