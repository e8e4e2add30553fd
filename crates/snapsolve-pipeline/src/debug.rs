//! Debug reply parsing.
//!
//! Debug prompts ask for five headed sections. Models follow the headings
//! loosely (markdown `#`, bold, numbering, trailing colon), so headers are
//! matched by keyword. Replies with no recognizable header are split into
//! paragraphs and each paragraph is filed by keyword instead.

use snapsolve_core::types::NormalizedAnswer;

use crate::classifier::{first_code_block, CodeBlock};
use crate::sections::{extract_sections, split_items};

/// The five sections a debug reply is organized into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugSection {
    Issues,
    Improvements,
    Optimizations,
    Explanation,
    KeyPoints,
}

impl DebugSection {
    pub const ALL: [DebugSection; 5] = [
        DebugSection::Issues,
        DebugSection::Improvements,
        DebugSection::Optimizations,
        DebugSection::Explanation,
        DebugSection::KeyPoints,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DebugSection::Issues => "Issues Identified",
            DebugSection::Improvements => "Specific Improvements and Corrections",
            DebugSection::Optimizations => "Optimizations",
            DebugSection::Explanation => "Explanation of Changes Needed",
            DebugSection::KeyPoints => "Key Points",
        }
    }

    /// Match a header line. Returns the section plus any text after a colon.
    fn from_header(line: &str) -> Option<(Self, Option<String>)> {
        let trimmed = line.trim();
        let marked = trimmed.starts_with('#') || trimmed.starts_with("**");

        let stripped = trimmed.trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());
        let stripped = stripped.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')' || c == ' ');
        let (head, rest) = match stripped.split_once(':') {
            Some((h, r)) => (h, Some(r.trim().trim_start_matches("**").trim().to_string())),
            None => (stripped, None),
        };
        let head = head.trim().trim_end_matches('*').trim();
        if head.is_empty() || head.split_whitespace().count() > 6 || head.ends_with('.') {
            return None;
        }

        let lower = head.to_lowercase();
        let lower = lower.strip_prefix("specific ").unwrap_or(&lower);
        let section = if lower.starts_with("issue") {
            DebugSection::Issues
        } else if lower.starts_with("improvement") || lower.starts_with("correction") {
            DebugSection::Improvements
        } else if lower.starts_with("optimi") {
            DebugSection::Optimizations
        } else if lower.starts_with("explanation") {
            DebugSection::Explanation
        } else if lower.starts_with("key point") {
            DebugSection::KeyPoints
        } else {
            return None;
        };

        // Without markdown, a colon line is a header only when its head is
        // drawn from the title ("Issues:", "Key points:"), and a plain line
        // only when it is the full title.
        let accepted = if marked {
            true
        } else if rest.is_some() {
            section.title_covers(head)
        } else {
            head.eq_ignore_ascii_case(section.title())
        };
        if !accepted {
            return None;
        }
        Some((section, rest.filter(|r| !r.is_empty())))
    }

    /// Whether every word of `head` appears in the title, ignoring case and
    /// a plural `s`.
    fn title_covers(&self, head: &str) -> bool {
        let title = self.title().to_lowercase();
        let words: Vec<&str> = title.split_whitespace().map(|w| w.trim_end_matches('s')).collect();
        head.to_lowercase()
            .split_whitespace()
            .all(|w| words.contains(&w.trim_end_matches('s')))
    }

    /// File an unheaded paragraph by keyword.
    fn from_keywords(paragraph: &str) -> Self {
        let p = paragraph.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| p.contains(w));
        if has(&["issue", "bug", "error"]) {
            DebugSection::Issues
        } else if has(&["improve", "correct", "fix"]) {
            DebugSection::Improvements
        } else if has(&["optimi", "performance"]) {
            DebugSection::Optimizations
        } else if has(&["key point", "summary", "takeaway"]) {
            DebugSection::KeyPoints
        } else {
            DebugSection::Explanation
        }
    }
}

/// A debug reply split into its sections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugReport {
    pub issues: Vec<String>,
    pub improvements: Vec<String>,
    pub optimizations: Vec<String>,
    pub explanation: Vec<String>,
    pub key_points: Vec<String>,
    pub code: Option<CodeBlock>,
    pub time_complexity: Option<String>,
    pub space_complexity: Option<String>,
}

impl DebugReport {
    pub fn section(&self, section: DebugSection) -> &[String] {
        match section {
            DebugSection::Issues => &self.issues,
            DebugSection::Improvements => &self.improvements,
            DebugSection::Optimizations => &self.optimizations,
            DebugSection::Explanation => &self.explanation,
            DebugSection::KeyPoints => &self.key_points,
        }
    }

    fn section_mut(&mut self, section: DebugSection) -> &mut Vec<String> {
        match section {
            DebugSection::Issues => &mut self.issues,
            DebugSection::Improvements => &mut self.improvements,
            DebugSection::Optimizations => &mut self.optimizations,
            DebugSection::Explanation => &mut self.explanation,
            DebugSection::KeyPoints => &mut self.key_points,
        }
    }

    pub fn is_empty(&self) -> bool {
        DebugSection::ALL.iter().all(|s| self.section(*s).is_empty()) && self.code.is_none()
    }

    /// Normalized markdown: one `###` heading per non-empty section, the
    /// corrected code after the improvements, complexities last.
    pub fn to_markdown(&self) -> String {
        let mut out: Vec<String> = Vec::new();
        for section in DebugSection::ALL {
            let items = self.section(section);
            if !items.is_empty() {
                let body = if section == DebugSection::Explanation {
                    items.join("\n\n")
                } else {
                    items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n")
                };
                out.push(format!("### {}\n{}", section.title(), body));
            }
            if section == DebugSection::Improvements {
                if let Some(code) = &self.code {
                    out.push(format!("```{}\n{}\n```", code.tag, code.body));
                }
            }
        }
        if let Some(t) = &self.time_complexity {
            out.push(format!("Time complexity: {t}"));
        }
        if let Some(s) = &self.space_complexity {
            out.push(format!("Space complexity: {s}"));
        }
        out.join("\n\n")
    }

    pub fn into_answer(self) -> NormalizedAnswer {
        let content = self.to_markdown();
        let mut answer = match &self.code {
            Some(code) => {
                let mut a = NormalizedAnswer::code(code.body.clone());
                a.content = content;
                a
            }
            None => NormalizedAnswer::analysis(content),
        };
        answer.thoughts = (!self.improvements.is_empty()).then_some(self.improvements);
        answer.key_takeaways = (!self.key_points.is_empty()).then_some(self.key_points);
        answer.time_complexity = self.time_complexity;
        answer.space_complexity = self.space_complexity;
        answer
    }
}

/// Split a debug reply into a [`DebugReport`].
pub fn parse_debug(text: &str) -> DebugReport {
    let mut report = DebugReport {
        code: first_code_block(text),
        ..Default::default()
    };
    let sections = extract_sections(text);
    report.time_complexity = sections.time_complexity;
    report.space_complexity = sections.space_complexity;

    let mut current: Option<DebugSection> = None;
    let mut pending: Vec<String> = Vec::new();
    let mut preamble: Vec<&str> = Vec::new();
    let mut found_header = false;
    let mut in_fence = false;

    let flush = |report: &mut DebugReport, section: Option<DebugSection>, lines: &mut Vec<String>| {
        if let Some(section) = section {
            report.section_mut(section).extend(split_items(lines));
        }
        lines.clear();
    };

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some((section, rest)) = DebugSection::from_header(line) {
            flush(&mut report, current, &mut pending);
            if !found_header {
                file_paragraphs(&mut report, &preamble.join("\n"));
            }
            found_header = true;
            current = Some(section);
            pending.extend(rest);
            continue;
        }
        if current.is_some() {
            pending.push(line.to_string());
        } else {
            preamble.push(line);
        }
    }
    flush(&mut report, current, &mut pending);

    if !found_header {
        file_paragraphs(&mut report, text);
    }
    report
}

/// File each paragraph of unheaded text into a section by keyword.
fn file_paragraphs(report: &mut DebugReport, text: &str) {
    for paragraph in paragraphs(text) {
        let section = DebugSection::from_keywords(&paragraph);
        report.section_mut(section).push(paragraph);
    }
}

/// Blank-line separated paragraphs outside code fences.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;

    let mut push = |current: &mut Vec<&str>| {
        if !current.is_empty() {
            out.push(current.join("\n"));
            current.clear();
        }
    };

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            push(&mut current);
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if line.trim().is_empty() {
            push(&mut current);
        } else {
            current.push(line.trim());
        }
    }
    push(&mut current);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapsolve_core::types::AnswerType;

    const HEADED: &str = "\
### Issues Identified
- Off-by-one in the loop bound
- Missing empty-input check

**Specific Improvements and Corrections:**
1. Iterate to `len - 1`
2. Return early on empty input

```python
def f(xs):
    if not xs:
        return 0
    return xs[-1]
```

## Optimizations
Avoid copying the list.

Explanation of Changes Needed:
The loop read past the end.

Key Points:
- Check bounds
- Handle empty input

Time complexity: O(1)
";

    #[test]
    fn test_headed_sections() {
        let report = parse_debug(HEADED);
        assert_eq!(report.issues, vec!["Off-by-one in the loop bound", "Missing empty-input check"]);
        assert_eq!(report.improvements, vec!["Iterate to `len - 1`", "Return early on empty input"]);
        assert_eq!(report.optimizations, vec!["Avoid copying the list."]);
        assert_eq!(report.explanation, vec!["The loop read past the end."]);
        assert_eq!(report.key_points, vec!["Check bounds", "Handle empty input"]);
        assert_eq!(report.code.as_ref().map(|c| c.tag.as_str()), Some("python"));
    }

    #[test]
    fn test_into_answer_code() {
        let answer = parse_debug(HEADED).into_answer();
        assert_eq!(answer.answer_type, AnswerType::Code);
        assert!(answer.code.starts_with("def f(xs):"));
        assert!(answer.content.contains("### Issues Identified"));
        assert!(answer.content.contains("```python"));
        assert_eq!(answer.thoughts.as_ref().map(Vec::len), Some(2));
        assert_eq!(answer.time_complexity.as_deref(), Some("O(1)"));
        assert_eq!(answer.space_complexity, None);
    }

    #[test]
    fn test_header_inline_text() {
        let report = parse_debug("Issues: the base case is wrong\nKey points: recursion needs a base case");
        assert_eq!(report.issues, vec!["the base case is wrong"]);
        assert_eq!(report.key_points, vec!["recursion needs a base case"]);
    }

    #[test]
    fn test_prose_line_not_header() {
        assert!(DebugSection::from_header("Issues like this are common in recursive code.").is_none());
        assert!(DebugSection::from_header("# Optimizations").is_some());
    }

    #[test]
    fn test_colon_prose_not_header() {
        assert!(DebugSection::from_header("Issue with the loop: it never ends").is_none());
        assert!(DebugSection::from_header("Explanation of changes: see below").is_some());
        assert!(DebugSection::from_header("**Issue with the loop:** it never ends").is_some());

        let report = parse_debug("### Issues Identified\nWrong bound.\nIssue with the loop: it never ends");
        assert_eq!(report.issues, vec!["Wrong bound.", "Issue with the loop: it never ends"]);
    }

    #[test]
    fn test_preamble_before_first_header_kept() {
        let text = "Your loop reads one element past the end of the array.\n\n### Issues Identified\n- off by one";
        let report = parse_debug(text);
        assert_eq!(report.explanation, vec!["Your loop reads one element past the end of the array."]);
        assert_eq!(report.issues, vec!["off by one"]);

        let answer = report.into_answer();
        assert!(answer.content.contains("Your loop reads one element past the end of the array."));
        assert!(answer.content.contains("- off by one"));
    }

    #[test]
    fn test_unheaded_paragraphs_by_keyword() {
        let text = "There is a bug when n is zero.\n\nYou should fix the guard clause.\n\nCaching results speeds up performance.\n\nIn summary, guard your inputs.\n\nThe rest looks fine.";
        let report = parse_debug(text);
        assert_eq!(report.issues, vec!["There is a bug when n is zero."]);
        assert_eq!(report.improvements, vec!["You should fix the guard clause."]);
        assert_eq!(report.optimizations, vec!["Caching results speeds up performance."]);
        assert_eq!(report.key_points, vec!["In summary, guard your inputs."]);
        assert_eq!(report.explanation, vec!["The rest looks fine."]);
    }

    #[test]
    fn test_analysis_without_code() {
        let answer = parse_debug("The rest looks fine.").into_answer();
        assert_eq!(answer.answer_type, AnswerType::Analysis);
        assert_eq!(answer.content, "### Explanation of Changes Needed\nThe rest looks fine.");
        assert_eq!(answer.thoughts, None);
    }
}
