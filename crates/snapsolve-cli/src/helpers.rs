//! Shared CLI helpers — path expansion, event and answer printing, and the
//! saved problem context that lets `debug` follow an earlier `solve`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use snapsolve_core::bus::PipelineEvent;
use snapsolve_core::types::{NormalizedAnswer, PipelineKind, ProblemContext};
use snapsolve_core::utils::{get_data_path, truncate_string};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ─────────────────────────────────────────────
// Saved context
// ─────────────────────────────────────────────

/// Where the last solved problem is kept between invocations.
pub fn context_path() -> PathBuf {
    get_data_path().join("last_context.json")
}

pub fn save_context(path: &Path, ctx: &ProblemContext) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(ctx)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// The saved context, or `None` when no solve has been saved yet.
pub fn load_context(path: &Path) -> Result<Option<ProblemContext>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let ctx = serde_json::from_str(&content)
        .with_context(|| format!("invalid problem context in {}", path.display()))?;
    Ok(Some(ctx))
}

// ─────────────────────────────────────────────
// Printing
// ─────────────────────────────────────────────

/// One status line for a non-terminal event. Outcomes (success, errors) are
/// reported from the run's result instead, so they map to `None`.
pub fn describe_event(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::Start => Some("solving...".to_string()),
        PipelineEvent::DebugStart => Some("debugging...".to_string()),
        PipelineEvent::Progress {
            message, percent, ..
        } => Some(format!("[{percent:>3}%] {message}")),
        PipelineEvent::ProblemExtracted(ctx) if !ctx.problem_statement.is_empty() => Some(
            format!("problem: {}", truncate_string(ctx.problem_statement.trim(), 80)),
        ),
        PipelineEvent::NoInput { kind } => Some(match kind {
            PipelineKind::Solve => "no screenshots in the main queue".to_string(),
            PipelineKind::Debug => "no screenshots in the extra queue".to_string(),
        }),
        PipelineEvent::Canceled { kind } => Some(format!("{} canceled", kind.as_str())),
        _ => None,
    }
}

pub fn print_event(event: &PipelineEvent) {
    let Some(line) = describe_event(event) else {
        return;
    };
    match event {
        PipelineEvent::NoInput { .. } | PipelineEvent::Canceled { .. } => {
            eprintln!("{} {}", "!".yellow(), line.yellow())
        }
        _ => eprintln!("{}", line.dimmed()),
    }
}

/// Print a normalized answer to stdout.
pub fn print_answer(answer: &NormalizedAnswer) {
    println!();
    println!("{}", "📸 SnapSolve".cyan().bold());
    println!();

    if answer.is_code() {
        if let Some(thoughts) = &answer.thoughts {
            println!("{}", "Thoughts".bold());
            for thought in thoughts {
                println!("  • {thought}");
            }
            println!();
        }
        println!("{}", "Code".bold());
        println!("{}", answer.code);
        println!();
    } else if answer.content.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", answer.content);
        println!();
    }

    if let Some(letter) = &answer.chosen_letter {
        println!("  {:<18} {}", "Answer:".bold(), letter.green().bold());
    }
    if let Some(takeaways) = &answer.key_takeaways {
        for takeaway in takeaways {
            println!("  {} {takeaway}", "✓".green());
        }
    }
    if let Some(time) = &answer.time_complexity {
        println!("  {:<18} {}", "Time:".bold(), time);
    }
    if let Some(space) = &answer.space_complexity {
        println!("  {:<18} {}", "Space:".bold(), space);
    }
    println!();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use snapsolve_core::types::QuestionType;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/foo/bar");
        assert!(result.ends_with("foo/bar"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        let result = expand_tilde("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn expand_tilde_bare() {
        let result = expand_tilde("~");
        assert!(!result.to_string_lossy().contains('~'));
    }

    #[test]
    fn context_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("last_context.json");
        let ctx = ProblemContext {
            question_type: QuestionType::MultipleChoice,
            problem_statement: "Which is prime?".into(),
            language: "python".into(),
            previous_answer: Some("C".into()),
            ..Default::default()
        };
        save_context(&path, &ctx).unwrap();
        assert_eq!(load_context(&path).unwrap(), Some(ctx));
    }

    #[test]
    fn load_context_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_context(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn load_context_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_context.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_context(&path).is_err());
    }

    #[test]
    fn describe_progress_and_outcomes() {
        let progress = PipelineEvent::progress(PipelineKind::Solve, "Extracting problem", 20);
        assert_eq!(describe_event(&progress).unwrap(), "[ 20%] Extracting problem");
        assert_eq!(
            describe_event(&PipelineEvent::NoInput { kind: PipelineKind::Debug }).unwrap(),
            "no screenshots in the extra queue"
        );
        assert!(describe_event(&PipelineEvent::SolutionError("boom".into())).is_none());
        assert!(describe_event(&PipelineEvent::SolutionSuccess(NormalizedAnswer::analysis("x"))).is_none());
    }

    #[test]
    fn describe_skips_empty_problem() {
        let event = PipelineEvent::ProblemExtracted(ProblemContext::default());
        assert!(describe_event(&event).is_none());
    }
}
