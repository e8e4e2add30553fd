//! Label-anchored section extraction for sectioned solution replies.
//!
//! Recognized labels (case-insensitive, at line start, outside code fences):
//! `Time complexity`, `Space complexity`, `Thoughts` / `Key insights` /
//! `Reasoning` / `Approach`. Code and solution labels only terminate the
//! preceding region. A region also ends where a code fence opens.

use std::sync::LazyLock;

use regex::Regex;

/// Used when a sectioned reply never states its time complexity.
pub const DEFAULT_TIME_COMPLEXITY: &str = "O(n) - Linear time complexity (not stated in response)";
/// Used when a sectioned reply never states its space complexity.
pub const DEFAULT_SPACE_COMPLEXITY: &str = "O(n) - Linear space complexity (not stated in response)";

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#{1,6}\s*)?(?:[-*]\s+)?(?:\*\*)?(time\s+complexity|space\s+complexity|thoughts|key\s+insights|reasoning|approach|code|solution|implementation|your\s+solution)(?:\*\*)?\s*(?:[:：]\s*(?:\*\*)?\s*(.*?)|)\s*$",
    )
    .expect("section label regex")
});

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+(.+?)\s*$").expect("bullet regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Label {
    Time,
    Space,
    Thoughts,
    Terminator,
}

impl Label {
    fn parse(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.starts_with("time") {
            Label::Time
        } else if name.starts_with("space") {
            Label::Space
        } else if matches!(name.split_whitespace().next(), Some("thoughts" | "key" | "reasoning" | "approach")) {
            Label::Thoughts
        } else {
            Label::Terminator
        }
    }
}

/// Fields recovered from a sectioned reply. Absent sections stay empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sections {
    pub thoughts: Vec<String>,
    pub time_complexity: Option<String>,
    pub space_complexity: Option<String>,
}

impl Sections {
    pub fn is_empty(&self) -> bool {
        self.thoughts.is_empty() && self.time_complexity.is_none() && self.space_complexity.is_none()
    }
}

/// Split `text` into labeled regions and pull out the known fields.
/// The first occurrence of each label wins.
pub fn extract_sections(text: &str) -> Sections {
    let mut regions: Vec<(Label, Vec<String>)> = Vec::new();
    let mut current: Option<(Label, Vec<String>)> = None;
    let mut in_fence = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            if let Some(region) = current.take() {
                regions.push(region);
            }
            continue;
        }
        if in_fence {
            continue;
        }

        if let Some(caps) = LABEL_RE.captures(line) {
            if let Some(region) = current.take() {
                regions.push(region);
            }
            let label = Label::parse(&caps[1]);
            let mut lines = Vec::new();
            if let Some(rest) = caps.get(2).map(|m| m.as_str().trim()) {
                if !rest.is_empty() {
                    lines.push(rest.to_string());
                }
            }
            current = Some((label, lines));
            continue;
        }

        if let Some((_, lines)) = current.as_mut() {
            lines.push(line.to_string());
        }
    }
    if let Some(region) = current.take() {
        regions.push(region);
    }

    let mut sections = Sections::default();
    for (label, lines) in regions {
        match label {
            Label::Time if sections.time_complexity.is_none() => {
                sections.time_complexity = join_region(&lines).map(|v| normalize_complexity(&v));
            }
            Label::Space if sections.space_complexity.is_none() => {
                sections.space_complexity = join_region(&lines).map(|v| normalize_complexity(&v));
            }
            Label::Thoughts if sections.thoughts.is_empty() => {
                sections.thoughts = split_items(&lines);
            }
            _ => {}
        }
    }
    sections
}

fn join_region(lines: &[String]) -> Option<String> {
    let joined = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Bullet or numbered lines become items; with no markers at all, every
/// non-empty line is an item.
pub fn split_items(lines: &[String]) -> Vec<String> {
    let bullets: Vec<String> = lines
        .iter()
        .filter_map(|l| BULLET_RE.captures(l).map(|c| c[1].to_string()))
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix a Big-O term when the value states none, inferred from wording.
/// Values that already contain `O(` pass through trimmed.
pub fn normalize_complexity(value: &str) -> String {
    let value = value.trim().trim_matches('*').trim();
    if value.to_uppercase().contains("O(") {
        return value.to_string();
    }
    format!("{} - {}", infer_big_o(value), value)
}

fn infer_big_o(text: &str) -> &'static str {
    let t = text.to_lowercase();
    if t.contains("factorial") {
        "O(n!)"
    } else if t.contains("exponential") {
        "O(2^n)"
    } else if t.contains("cubic") {
        "O(n^3)"
    } else if t.contains("quadratic") {
        "O(n^2)"
    } else if t.contains("n log n") || t.contains("nlogn") || t.contains("linearithmic") {
        "O(n log n)"
    } else if t.contains("logarithmic") || t.contains("log n") {
        "O(log n)"
    } else if t.contains("constant") {
        "O(1)"
    } else {
        "O(n)"
    }
}
