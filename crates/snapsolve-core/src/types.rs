//! Core types for SnapSolve — provider identities, credentials, image
//! payloads, and the canonical answer shape every provider is reduced to.
//!
//! The UI boundary consumes these types through JSON, so wire-visible
//! structs serialize with camelCase keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ─────────────────────────────────────────────
// Provider identity
// ─────────────────────────────────────────────

/// The closed set of supported provider families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// OpenAI chat completions with image parts.
    #[default]
    OpenAi,
    /// Google Gemini single-shot `generateContent`.
    Gemini,
    /// Anthropic messages API with image blocks.
    Anthropic,
}

impl ProviderId {
    /// All providers, in display order.
    pub const ALL: [ProviderId; 3] = [ProviderId::OpenAi, ProviderId::Gemini, ProviderId::Anthropic];

    /// Config / wire name (e.g. `"openai"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderId::OpenAi),
            "gemini" | "google" => Ok(ProviderId::Gemini),
            "anthropic" | "claude" => Ok(ProviderId::Anthropic),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

// ─────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────

/// Credentials for the active provider, derived from configuration.
#[derive(Clone, PartialEq, Default)]
pub struct Credentials {
    pub provider: ProviderId,
    pub api_key: String,
    /// Model override; the provider default is used when `None`.
    pub model: Option<String>,
    /// Base URL override; the provider default is used when `None`.
    pub api_base: Option<String>,
}

impl Credentials {
    pub fn new(provider: ProviderId, api_key: impl Into<String>) -> Self {
        Credentials {
            provider,
            api_key: api_key.into(),
            model: None,
            api_base: None,
        }
    }

    /// Whether an API key is present at all (shape is checked by the registry).
    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("provider", &self.provider)
            .field("api_key", &if self.has_key() { "<redacted>" } else { "<empty>" })
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

// ─────────────────────────────────────────────
// Image payloads
// ─────────────────────────────────────────────

/// A screenshot ready to be forwarded to a provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePayload {
    /// Where the screenshot came from (identity only; the file is not owned).
    pub path: PathBuf,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl ImagePayload {
    pub fn new(path: impl Into<PathBuf>, data: impl Into<String>) -> Self {
        ImagePayload {
            path: path.into(),
            data: data.into(),
        }
    }

    /// MIME type derived from the file extension, `image/png` when unknown.
    pub fn media_type(&self) -> &'static str {
        media_type_for(&self.path)
    }

    /// `data:` URI form used by chat-completion image parts.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type(), self.data)
    }
}

fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

// ─────────────────────────────────────────────
// Normalized answer
// ─────────────────────────────────────────────

/// Broad shape of an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Code,
    Analysis,
}

/// The canonical result every provider reply is reduced to.
///
/// `Code` answers always carry a non-empty `code`; `Analysis` answers carry
/// the full prose in `content` and set `chosen_letter` only when a
/// multiple-choice letter was confidently detected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAnswer {
    pub answer_type: AnswerType,
    pub content: String,
    pub code: String,
    pub thoughts: Option<Vec<String>>,
    pub time_complexity: Option<String>,
    pub space_complexity: Option<String>,
    pub key_takeaways: Option<Vec<String>>,
    pub chosen_letter: Option<String>,
}

impl NormalizedAnswer {
    /// A code answer; `content` mirrors the code.
    pub fn code(code: impl Into<String>) -> Self {
        let code = code.into();
        NormalizedAnswer {
            answer_type: AnswerType::Code,
            content: code.clone(),
            code,
            thoughts: None,
            time_complexity: None,
            space_complexity: None,
            key_takeaways: None,
            chosen_letter: None,
        }
    }

    /// A prose answer with no structured fields.
    pub fn analysis(content: impl Into<String>) -> Self {
        NormalizedAnswer {
            answer_type: AnswerType::Analysis,
            content: content.into(),
            code: String::new(),
            thoughts: None,
            time_complexity: None,
            space_complexity: None,
            key_takeaways: None,
            chosen_letter: None,
        }
    }

    pub fn is_code(&self) -> bool {
        self.answer_type == AnswerType::Code
    }
}

// ─────────────────────────────────────────────
// Problem context
// ─────────────────────────────────────────────

/// What kind of question the screenshots show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Coding,
    MultipleChoice,
    #[default]
    Other,
}

impl QuestionType {
    /// Lenient parse of the model's own label ("coding", "multiple-choice", "MCQ", …).
    pub fn from_label(label: &str) -> Self {
        let l = label.to_lowercase();
        if l.contains("multiple") || l.contains("choice") || l == "mcq" || l.contains("选择") {
            QuestionType::MultipleChoice
        } else if l.contains("cod") || l.contains("program") || l.contains("algorithm") || l.contains("编程") {
            QuestionType::Coding
        } else {
            QuestionType::Other
        }
    }
}

/// Problem description produced by the solve pipeline and reused by debug.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProblemContext {
    pub question_type: QuestionType,
    pub problem_statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_output: Option<String>,
    /// Preferred language at the time of the solve.
    pub language: String,
    /// The solve pipeline's answer (code or prose), attached on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_answer: Option<String>,
}

// ─────────────────────────────────────────────
// Pipeline kinds
// ─────────────────────────────────────────────

/// The two independent request flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Solve,
    Debug,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Solve => "solve",
            PipelineKind::Debug => "debug",
        }
    }

    /// Slot index for per-kind state arrays.
    pub fn index(&self) -> usize {
        match self {
            PipelineKind::Solve => 0,
            PipelineKind::Debug => 1,
        }
    }

    /// The other pipeline kind.
    pub fn other(&self) -> PipelineKind {
        match self {
            PipelineKind::Solve => PipelineKind::Debug,
            PipelineKind::Debug => PipelineKind::Solve,
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_id_serialization() {
        assert_eq!(serde_json::to_value(ProviderId::OpenAi).unwrap(), json!("openai"));
        assert_eq!(serde_json::to_value(ProviderId::Anthropic).unwrap(), json!("anthropic"));
        let id: ProviderId = serde_json::from_value(json!("gemini")).unwrap();
        assert_eq!(id, ProviderId::Gemini);
    }

    #[test]
    fn test_provider_id_from_str_aliases() {
        assert_eq!("Claude".parse::<ProviderId>().unwrap(), ProviderId::Anthropic);
        assert_eq!(" google ".parse::<ProviderId>().unwrap(), ProviderId::Gemini);
        assert!("mistral".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = Credentials::new(ProviderId::OpenAi, "sk-secret-value-123456789");
        let shown = format!("{creds:?}");
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(ImagePayload::new("/tmp/a.PNG", "x").media_type(), "image/png");
        assert_eq!(ImagePayload::new("/tmp/a.jpeg", "x").media_type(), "image/jpeg");
        assert_eq!(ImagePayload::new("/tmp/a.webp", "x").media_type(), "image/webp");
        assert_eq!(ImagePayload::new("/tmp/noext", "x").media_type(), "image/png");
    }

    #[test]
    fn test_data_url() {
        let img = ImagePayload::new("shot.jpg", "abc123");
        assert_eq!(img.data_url(), "data:image/jpeg;base64,abc123");
    }

    #[test]
    fn test_normalized_answer_camel_case() {
        let mut answer = NormalizedAnswer::analysis("pick C");
        answer.chosen_letter = Some("C".into());
        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(value["answerType"], "analysis");
        assert_eq!(value["chosenLetter"], "C");
        assert!(value["timeComplexity"].is_null());
    }

    #[test]
    fn test_code_answer_mirrors_content() {
        let answer = NormalizedAnswer::code("print(1)");
        assert!(answer.is_code());
        assert_eq!(answer.content, "print(1)");
    }

    #[test]
    fn test_question_type_from_label() {
        assert_eq!(QuestionType::from_label("multiple_choice"), QuestionType::MultipleChoice);
        assert_eq!(QuestionType::from_label("Coding"), QuestionType::Coding);
        assert_eq!(QuestionType::from_label("选择题"), QuestionType::MultipleChoice);
        assert_eq!(QuestionType::from_label("essay"), QuestionType::Other);
    }

    #[test]
    fn test_pipeline_kind_other() {
        assert_eq!(PipelineKind::Solve.other(), PipelineKind::Debug);
        assert_eq!(PipelineKind::Debug.to_string(), "debug");
    }
}
