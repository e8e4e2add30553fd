//! `snapsolve onboard` — initialize configuration and screenshot directories.
//!
//! - Creates or updates `~/.snapsolve/config.json`
//! - Creates the main and extra screenshot queue directories

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use snapsolve_core::config::{get_config_path, load_config, save_config, Config};
use snapsolve_core::types::ProviderId;
use snapsolve_core::utils::expand_home;
use snapsolve_providers::spec_for;

/// Run the onboard command.
pub fn run(
    provider: Option<ProviderId>,
    api_key: Option<String>,
    language: Option<String>,
) -> Result<()> {
    println!();
    println!("{}", "📸 SnapSolve — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let existed = config_path.exists();
    let changed = provider.is_some() || api_key.is_some() || language.is_some();

    // 1. Create or update the config
    let config = apply_overrides(load_config(Some(&config_path)), provider, api_key, language);
    if existed && !changed {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        save_config(&config, Some(&config_path))?;
        println!(
            "  {} {} config at {}",
            "✓".green(),
            if existed { "updated" } else { "created" },
            config_path.display()
        );
    }

    // 2. Check the key against the provider's format
    let spec = spec_for(config.api_provider);
    match spec.validate_api_key(config.api_key.trim()) {
        Ok(()) => println!("  {} {} key looks valid", "✓".green(), spec.display_name),
        Err(reason) => println!("  {} {}", "!".yellow(), reason.yellow()),
    }

    // 3. Screenshot queues
    ensure_dir(&expand_home(&config.screenshots.queue_dir), "screenshot queue")?;
    ensure_dir(&expand_home(&config.screenshots.extra_queue_dir), "extra screenshot queue")?;

    println!();
    println!(
        "{}",
        "  Setup complete! Drop screenshots into the queue and run `snapsolve solve`.".green()
    );
    println!();

    Ok(())
}

/// Apply command-line settings on top of the loaded config.
fn apply_overrides(
    mut config: Config,
    provider: Option<ProviderId>,
    api_key: Option<String>,
    language: Option<String>,
) -> Config {
    if let Some(provider) = provider {
        config.api_provider = provider;
    }
    if let Some(key) = api_key {
        config.api_key = key.trim().to_string();
    }
    if let Some(language) = language.filter(|l| !l.trim().is_empty()) {
        config.language = language.trim().to_string();
    }
    config
}

/// Create a directory if it doesn't exist.
fn ensure_dir(path: &Path, label: &str) -> Result<()> {
    if path.is_dir() {
        println!("  {} {} at {}", "✓".green(), label, path.display());
    } else {
        std::fs::create_dir_all(path)?;
        println!("  {} created {} at {}", "✓".green(), label, path.display());
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b");
        ensure_dir(&path, "queue").unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn ensure_dir_existing_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shot.png"), b"x").unwrap();
        ensure_dir(dir.path(), "queue").unwrap();
        assert!(dir.path().join("shot.png").exists());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let config = apply_overrides(
            Config::default(),
            Some(ProviderId::Gemini),
            Some("  AIzaSyExampleKey123 ".into()),
            None,
        );
        assert_eq!(config.api_provider, ProviderId::Gemini);
        assert_eq!(config.api_key, "AIzaSyExampleKey123");
        assert_eq!(config.language, "python");
    }

    #[test]
    fn blank_language_is_ignored() {
        let config = apply_overrides(Config::default(), None, None, Some("   ".into()));
        assert_eq!(config.language, "python");
    }
}
