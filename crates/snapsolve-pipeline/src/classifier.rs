//! Answer classification: free text → [`NormalizedAnswer`].
//!
//! Priority order:
//! 1. first fenced block with a non-blank body → `code`
//! 2. a "final answer: X" label, or a line that is just a letter A–D →
//!    `analysis` with `chosen_letter`
//! 3. anything else → `analysis` with the trimmed prose
//!
//! A code fence always wins over a multiple-choice match. Classification
//! never fails.

use std::sync::LazyLock;

use regex::Regex;
use snapsolve_core::types::NormalizedAnswer;
use snapsolve_core::utils::contains_cjk;

use crate::sections::{extract_sections, DEFAULT_SPACE_COMPLEXITY, DEFAULT_TIME_COMPLEXITY};

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([\w+#.-]*)[ \t]*\r?\n(.*?)```").expect("code fence regex"));

// An uppercase letter counts only when followed by end of line, punctuation,
// a connective ("because", "since", ...) or a non-lowercase token, so the
// article in "Answer: A hash map ..." is not read as option A.
static ANSWER_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?i:final\s+answer|correct\s+answer|answer|最终答案|正确答案|答案)\s*(?i:is)?\s*[:：]\s*(?:\*\*)?\s*(?:\(([A-Da-d])\)|([A-D])(?:[ \t]*$|[).,;:!*，。；：、\-–—]|[ \t]+(?:because|since|as|is|which)\b|[ \t]+[^a-z\s])|([a-d])[.)]?[ \t]*$)",
    )
    .expect("answer label regex")
});

static BARE_LETTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\*\*)?\(?([A-Da-d])\)?\.?(?:\*\*)?[ \t]*$").expect("bare letter regex")
});

/// A fenced code block found in a reply.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    /// Fence tag, empty when untagged.
    pub tag: String,
    /// Trimmed body.
    pub body: String,
}

/// First fenced block whose body is not blank.
pub fn first_code_block(text: &str) -> Option<CodeBlock> {
    FENCE_RE.captures_iter(text).find_map(|caps| {
        let body = caps[2].trim();
        (!body.is_empty()).then(|| CodeBlock {
            tag: caps[1].to_string(),
            body: body.to_string(),
        })
    })
}

/// Multiple-choice letter, from an explicit answer label or a bare letter line.
pub fn detect_choice(text: &str) -> Option<char> {
    let labeled = ANSWER_LABEL_RE.captures(text).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .and_then(|m| m.as_str().chars().next())
    });
    labeled
        .or_else(|| {
            BARE_LETTER_RE
                .captures(text)
                .and_then(|caps| caps[1].chars().next())
        })
        .map(|c| c.to_ascii_uppercase())
}

/// Classifier configured with the user's preferred language.
#[derive(Clone, Debug)]
pub struct AnswerClassifier {
    language: String,
    /// Sectioned replies from the two-stage protocol: missing complexity is
    /// filled with default text instead of left absent.
    sections: bool,
}

impl AnswerClassifier {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            sections: false,
        }
    }

    pub fn with_sections(mut self, sections: bool) -> Self {
        self.sections = sections;
        self
    }

    pub fn classify(&self, text: &str) -> NormalizedAnswer {
        if let Some(block) = first_code_block(text) {
            return self.code_answer(text, block);
        }

        let content = text.trim();
        if let Some(letter) = detect_choice(content) {
            let mut answer = NormalizedAnswer::analysis(content);
            let takeaway = if contains_cjk(content) {
                format!("正确选项：{letter}")
            } else {
                format!("Correct option: {letter}")
            };
            answer.chosen_letter = Some(letter.to_string());
            answer.key_takeaways = Some(vec![takeaway]);
            return answer;
        }

        NormalizedAnswer::analysis(content)
    }

    fn code_answer(&self, text: &str, block: CodeBlock) -> NormalizedAnswer {
        let sections = extract_sections(text);
        let language = if block.tag.is_empty() {
            self.language.as_str()
        } else {
            block.tag.as_str()
        };

        let mut answer = NormalizedAnswer::code(block.body);
        answer.thoughts = Some(if sections.thoughts.is_empty() {
            vec![format!("Solution implemented in {language}.")]
        } else {
            sections.thoughts
        });

        answer.time_complexity = sections.time_complexity;
        answer.space_complexity = sections.space_complexity;
        if self.sections {
            answer
                .time_complexity
                .get_or_insert_with(|| DEFAULT_TIME_COMPLEXITY.to_string());
            answer
                .space_complexity
                .get_or_insert_with(|| DEFAULT_SPACE_COMPLEXITY.to_string());
        }
        answer
    }
}

/// Classify with default settings (no section defaulting).
pub fn classify(text: &str, language: &str) -> NormalizedAnswer {
    AnswerClassifier::new(language).classify(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapsolve_core::types::AnswerType;

    #[test]
    fn test_code_fence_wins_over_final_answer() {
        let text = "Final answer: B\n\n```python\nprint('b')\n```";
        let answer = classify(text, "python");
        assert_eq!(answer.answer_type, AnswerType::Code);
        assert_eq!(answer.code, "print('b')");
        assert_eq!(answer.content, answer.code);
        assert_eq!(answer.chosen_letter, None);
    }

    #[test]
    fn test_prose_fallback() {
        let text = "  The function is correct because it handles empty input.  ";
        let answer = classify(text, "python");
        assert_eq!(answer.answer_type, AnswerType::Analysis);
        assert_eq!(answer.content, text.trim());
        assert_eq!(answer.chosen_letter, None);
        assert_eq!(answer.thoughts, None);
        assert_eq!(answer.key_takeaways, None);
    }

    #[test]
    fn test_empty_text_is_analysis() {
        let answer = classify("", "python");
        assert_eq!(answer.answer_type, AnswerType::Analysis);
        assert_eq!(answer.content, "");
    }

    #[test]
    fn test_chinese_final_answer() {
        let answer = classify("最终答案：C\n因为C最符合题意", "python");
        assert_eq!(answer.answer_type, AnswerType::Analysis);
        assert_eq!(answer.chosen_letter.as_deref(), Some("C"));
        assert_eq!(answer.key_takeaways, Some(vec!["正确选项：C".to_string()]));
    }

    #[test]
    fn test_english_final_answer() {
        let answer = classify("Let's reason.\n**Final Answer:** (b)", "python");
        assert_eq!(answer.chosen_letter.as_deref(), Some("B"));
        assert_eq!(answer.key_takeaways, Some(vec!["Correct option: B".to_string()]));
    }

    #[test]
    fn test_answer_word_not_a_letter() {
        let answer = classify("Answer: Because the loop never ends, it hangs.", "python");
        assert_eq!(answer.chosen_letter, None);
    }

    #[test]
    fn test_article_after_label_not_a_letter() {
        let answer = classify("Answer: A hash map gives O(1) lookups, so use one.", "python");
        assert_eq!(answer.chosen_letter, None);
        assert_eq!(answer.key_takeaways, None);
    }

    #[test]
    fn test_letter_followed_by_reason() {
        assert_eq!(detect_choice("Answer: C because 7 is prime"), Some('C'));
        assert_eq!(detect_choice("Final answer: B (7 is prime)"), Some('B'));
        assert_eq!(detect_choice("答案：D，因为它最快"), Some('D'));
        assert_eq!(detect_choice("Answer: A."), Some('A'));
    }

    #[test]
    fn test_bare_letter_line() {
        let answer = classify("Options considered.\n\n**D.**\n", "python");
        assert_eq!(answer.chosen_letter.as_deref(), Some("D"));
    }

    #[test]
    fn test_untagged_fence_uses_preferred_language() {
        let answer = classify("```\nfn main() {}\n```", "rust");
        assert!(answer.is_code());
        assert_eq!(answer.thoughts, Some(vec!["Solution implemented in rust.".to_string()]));
        assert_eq!(answer.time_complexity, None);
    }

    #[test]
    fn test_blank_fence_skipped() {
        let answer = classify("```python\n   \n```\nthen\n```js\nconsole.log(1)\n```", "python");
        assert_eq!(answer.code, "console.log(1)");
    }

    #[test]
    fn test_sectioned_code_answer() {
        let text = "```python\ndef f(): return 1\n```\nTime complexity: O(1)\nThoughts:\n- Return a constant\n- No input needed";
        let answer = AnswerClassifier::new("python").with_sections(true).classify(text);
        assert_eq!(answer.code, "def f(): return 1");
        assert_eq!(answer.time_complexity.as_deref(), Some("O(1)"));
        assert_eq!(answer.space_complexity.as_deref(), Some(DEFAULT_SPACE_COMPLEXITY));
        assert_eq!(
            answer.thoughts,
            Some(vec!["Return a constant".to_string(), "No input needed".to_string()])
        );
    }
}
