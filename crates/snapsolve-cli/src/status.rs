//! `snapsolve status` — show configuration, key, and queue status.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use snapsolve_core::config::{get_config_path, load_config};
use snapsolve_pipeline::{DirScreenshotSource, ScreenshotSource};
use snapsolve_providers::spec_for;

/// Run the status command.
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref());
    let config_path = config_path.unwrap_or_else(get_config_path);

    println!();
    println!("{}", "📸 SnapSolve Status".cyan().bold());
    println!();

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // Provider + model
    let spec = spec_for(config.api_provider);
    let credentials = config.credentials();
    println!("  {:<18} {}", "Provider:".bold(), spec.display_name);
    println!(
        "  {:<18} {}",
        "Model:".bold(),
        credentials.model.as_deref().unwrap_or(spec.default_model)
    );

    // API key
    let key_status = if credentials.api_key.is_empty() {
        format!("{}", "· not configured".dimmed())
    } else {
        match spec.validate_api_key(&credentials.api_key) {
            Ok(()) => format!("{} (key set)", "✓".green()),
            Err(reason) => format!("{} {}", "✗".red(), reason.red()),
        }
    };
    println!("  {:<18} {}", "API key:".bold(), key_status);

    let two_stage = config
        .active_provider()
        .structured_protocol
        .unwrap_or(spec.structured_protocol);
    println!(
        "  {:<18} {} | timeout: {}s",
        "Parameters:".bold(),
        format!("language: {}", config.language).dimmed(),
        format!("{}", config.pipeline.timeout_secs).dimmed(),
    );
    println!(
        "  {:<18} {}",
        "Protocol:".bold(),
        if two_stage { "two-stage" } else { "single-shot" }
    );

    // Screenshot queues
    println!();
    println!("  {}", "Queues:".bold());
    let source = DirScreenshotSource::from_config(&config.screenshots);
    let main = source.main_queue().await.map(|q| q.len());
    let extra = source.extra_queue().await.map(|q| q.len());
    for (label, dir, count) in [
        ("main", source.main_dir(), main),
        ("extra", source.extra_dir(), extra),
    ] {
        let status = match count {
            Ok(n) => format!("{n} screenshot(s)"),
            Err(e) => format!("{}", format!("unreadable: {e}").red()),
        };
        println!("    {:<20} {} {}", label, dir.display(), status.dimmed());
    }

    // Saved context
    println!();
    let context = crate::helpers::context_path();
    let context_status = if context.exists() {
        format!("{} {}", "✓".green(), context.display())
    } else {
        format!("{}", "· none (run `snapsolve solve` first)".dimmed())
    };
    println!("  {:<18} {}", "Last problem:".bold(), context_status);

    println!();

    Ok(())
}
