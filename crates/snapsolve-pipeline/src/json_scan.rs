//! Tolerant JSON recovery for the problem-extraction stage.
//!
//! Models asked for strict JSON still wrap it in prose or fences. The reply
//! is parsed directly first; failing that, every balanced `{…}` / `[…]` span
//! is collected in one string- and escape-aware pass and the largest one
//! that parses wins.

use serde::Deserialize;
use serde_json::Value;
use snapsolve_core::types::{ProblemContext, QuestionType};
use snapsolve_core::SolveError;

/// Parse `text` as JSON, falling back to the largest parseable balanced span.
pub fn scan_json(text: &str) -> Result<Value, SolveError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let mut spans = balanced_spans(trimmed);
    spans.sort_by_key(|(start, end)| std::cmp::Reverse(end - start));

    spans
        .into_iter()
        .find_map(|(start, end)| serde_json::from_str::<Value>(&trimmed[start..end]).ok())
        .ok_or_else(|| SolveError::MalformedUpstream("no parseable JSON object in extraction reply".into()))
}

/// Byte ranges of every balanced bracket span, found in a single pass.
/// Quotes only open a string inside a bracket, so quotes in surrounding
/// prose are ignored. A mismatched closer abandons every open span.
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<(usize, char)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push((i, '}')),
            '[' => open.push((i, ']')),
            '}' | ']' if !open.is_empty() => match open.pop() {
                Some((start, close)) if close == c => spans.push((start, i + c.len_utf8())),
                _ => open.clear(),
            },
            _ => {}
        }
    }
    spans
}

// ─────────────────────────────────────────────
// Extraction reply → ProblemContext
// ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractedProblem {
    #[serde(alias = "questionType", alias = "type")]
    question_type: Option<String>,
    #[serde(alias = "problemStatement", alias = "problem", alias = "question")]
    problem_statement: Option<Value>,
    constraints: Option<Value>,
    #[serde(alias = "exampleInput")]
    example_input: Option<Value>,
    #[serde(alias = "exampleOutput")]
    example_output: Option<Value>,
}

/// Turn the stage-one reply into a problem context.
///
/// An array reply uses its first object. A reply without any problem
/// statement is treated as malformed, since stage two has nothing to solve.
pub fn problem_from_reply(text: &str, language: &str) -> Result<ProblemContext, SolveError> {
    let value = match scan_json(text)? {
        Value::Array(items) => items
            .into_iter()
            .find(Value::is_object)
            .ok_or_else(|| SolveError::MalformedUpstream("extraction reply array has no object".into()))?,
        other => other,
    };

    let extracted: ExtractedProblem = serde_json::from_value(value)
        .map_err(|e| SolveError::MalformedUpstream(format!("extraction reply shape: {e}")))?;

    let problem_statement = extracted
        .problem_statement
        .as_ref()
        .and_then(flatten)
        .ok_or_else(|| SolveError::MalformedUpstream("extraction reply has no problem statement".into()))?;

    Ok(ProblemContext {
        question_type: extracted
            .question_type
            .as_deref()
            .map(QuestionType::from_label)
            .unwrap_or_default(),
        problem_statement,
        constraints: extracted.constraints.as_ref().and_then(flatten),
        example_input: extracted.example_input.as_ref().and_then(flatten),
        example_output: extracted.example_output.as_ref().and_then(flatten),
        language: language.to_string(),
        previous_answer: None,
    })
}

/// Strings pass through, arrays become lines, other scalars are rendered.
fn flatten(value: &Value) -> Option<String> {
    let s = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(flatten)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    };
    (!s.is_empty()).then_some(s)
}
