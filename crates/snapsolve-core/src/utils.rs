//! Utility helpers — path resolution and string manipulation.

use std::path::PathBuf;

/// Get the SnapSolve data directory (e.g. `~/.snapsolve/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".snapsolve")
}

/// Directory holding the main screenshot queue (e.g. `~/.snapsolve/screenshots/`).
pub fn get_screenshots_path() -> PathBuf {
    get_data_path().join("screenshots")
}

/// Directory holding the extra (debug) screenshot queue.
pub fn get_extra_screenshots_path() -> PathBuf {
    get_data_path().join("extra_screenshots")
}

/// Get current ISO 8601 timestamp.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Whether the text contains any CJK ideograph or CJK punctuation.
pub fn contains_cjk(s: &str) -> bool {
    s.chars().any(|c| {
        matches!(c,
            '\u{3000}'..='\u{303F}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FF00}'..='\u{FFEF}')
    })
}

/// Expand `~` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(rest)
    } else if path == "~" {
        home_dir().unwrap_or_else(|| PathBuf::from("."))
    } else {
        PathBuf::from(path)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
