//! SnapSolve CLI — entry point.
//!
//! # Commands
//!
//! - `snapsolve solve` — solve the problem in the main screenshot queue
//! - `snapsolve debug` — review the last answer against the extra screenshots
//! - `snapsolve status` — show configuration, key, and queue status
//! - `snapsolve onboard` — create the config and the screenshot directories

mod helpers;
mod onboard;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use snapsolve_core::bus::EventBus;
use snapsolve_core::config::load_config;
use snapsolve_core::types::{PipelineKind, ProviderId};
use snapsolve_pipeline::{DirScreenshotSource, FileConfigSource, PipelineCoordinator};
use snapsolve_providers::ClientRegistry;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 📸 SnapSolve — solve coding and multiple-choice problems from screenshots
#[derive(Parser)]
#[command(name = "snapsolve", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the problem shown in the main screenshot queue
    Solve {
        /// Config file (default: ~/.snapsolve/config.json)
        #[arg(short, long)]
        config: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Debug the last answer using the extra screenshot queue
    Debug {
        /// Config file (default: ~/.snapsolve/config.json)
        #[arg(short, long)]
        config: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration, key, and queue status
    Status {
        /// Config file (default: ~/.snapsolve/config.json)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize configuration and screenshot directories
    Onboard {
        /// Active provider: openai, gemini, or anthropic
        #[arg(short, long)]
        provider: Option<ProviderId>,

        /// API key for the active provider
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Preferred answer language (e.g. python, java, cpp)
        #[arg(short, long)]
        language: Option<String>,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { config, logs } => {
            init_logging(logs);
            run_pipeline(PipelineKind::Solve, config.map(|p| helpers::expand_tilde(&p))).await
        }
        Commands::Debug { config, logs } => {
            init_logging(logs);
            run_pipeline(PipelineKind::Debug, config.map(|p| helpers::expand_tilde(&p))).await
        }
        Commands::Status { config } => {
            status::run(config.map(|p| helpers::expand_tilde(&p))).await
        }
        Commands::Onboard {
            provider,
            api_key,
            language,
        } => onboard::run(provider, api_key, language),
    }
}

// ─────────────────────────────────────────────
// Solve / debug
// ─────────────────────────────────────────────

/// Run one pipeline to completion, printing events as they arrive.
/// Ctrl-C cancels the run.
async fn run_pipeline(kind: PipelineKind, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref());
    let bus = Arc::new(EventBus::new(config.pipeline.event_buffer.max(1)));

    let coordinator = Arc::new(PipelineCoordinator::new(
        ClientRegistry::http(std::time::Duration::from_secs(config.pipeline.timeout_secs.max(1))),
        Arc::new(DirScreenshotSource::from_config(&config.screenshots)),
        Arc::new(FileConfigSource::new(config_path)),
        bus.sender(),
    ));

    let context_path = helpers::context_path();
    if kind == PipelineKind::Debug {
        if let Some(ctx) = helpers::load_context(&context_path)? {
            debug!(path = %context_path.display(), "restored problem context");
            coordinator.restore_context(ctx).await;
        }
    }

    let canceller = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(kind = kind.as_str(), "interrupt received, canceling");
                coordinator.cancel(kind).await;
            }
        })
    };

    let printer = {
        let bus = bus.clone();
        tokio::spawn(async move {
            while let Some(envelope) = bus.next().await {
                helpers::print_event(&envelope.event);
            }
        })
    };

    let result = match kind {
        PipelineKind::Solve => coordinator.process_solve().await,
        PipelineKind::Debug => coordinator.process_debug().await,
    };

    canceller.abort();
    printer.abort();
    let _ = printer.await;
    for event in bus.drain().await {
        helpers::print_event(&event);
    }

    match result {
        Ok(answer) => {
            helpers::print_answer(&answer);
            if kind == PipelineKind::Solve {
                if let Some(ctx) = coordinator.problem_context().await {
                    helpers::save_context(&context_path, &ctx)?;
                }
            }
            Ok(())
        }
        Err(e) if e.is_canceled() => Ok(()),
        Err(e) => Err(anyhow!(e.user_message())),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("snapsolve=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
