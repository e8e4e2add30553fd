//! Prompt templates for the solve and debug flows.
//!
//! The preferred language is forwarded verbatim. Section labels requested
//! here are the ones [`crate::sections`] and [`crate::debug`] look for.

use snapsolve_core::types::{ProblemContext, QuestionType};

use crate::debug::DebugSection;

/// Stage one of the two-stage protocol: describe the screenshots as JSON.
pub fn extraction_prompt(language: &str) -> String {
    format!(
        "Extract the problem shown in these screenshots. Respond with strict JSON only, \
         no prose and no code fences, using exactly these keys:\n\
         {{\n  \"question_type\": \"coding\" | \"multiple_choice\" | \"other\",\n  \
         \"problem_statement\": string,\n  \"constraints\": string | null,\n  \
         \"example_input\": string | null,\n  \"example_output\": string | null\n}}\n\
         The user's preferred language is {language}."
    )
}

/// Stage two: solve from the extracted context, no images, labeled sections.
pub fn solution_prompt(ctx: &ProblemContext) -> String {
    let mut parts = vec![format!("Problem statement:\n{}", ctx.problem_statement)];
    if let Some(c) = &ctx.constraints {
        parts.push(format!("Constraints:\n{c}"));
    }
    if let Some(i) = &ctx.example_input {
        parts.push(format!("Example input:\n{i}"));
    }
    if let Some(o) = &ctx.example_output {
        parts.push(format!("Example output:\n{o}"));
    }

    let instructions = match ctx.question_type {
        QuestionType::MultipleChoice => "This is a multiple-choice question. Explain briefly, then end with a line \
             `Final answer: X` where X is the letter of the correct option."
            .to_string(),
        _ => format!(
            "Solve the problem in {lang}. Reply with these labeled sections:\n\
             Code:\n```{lang}\n<complete solution>\n```\n\
             Thoughts:\n- <key insight>\n- <key insight>\n\
             Time complexity: O(...) - <reason>\n\
             Space complexity: O(...) - <reason>",
            lang = ctx.language
        ),
    };
    parts.push(instructions);
    parts.join("\n\n")
}

/// Single-shot solve: screenshots plus one instruction.
pub fn single_shot_prompt(language: &str) -> String {
    format!(
        "Solve the problem shown in these screenshots.\n\
         - If it is a coding problem, put the complete solution in {language} inside one fenced code block, \
         then add `Thoughts:` as a bulleted list, `Time complexity:` and `Space complexity:`.\n\
         - If it is a multiple-choice question, end with a line `Final answer: X` (X is the option letter).\n\
         - Otherwise answer in clear prose."
    )
}

/// Debug: the original problem, the earlier answer, and new screenshots of
/// the user's code or errors.
pub fn debug_prompt(ctx: &ProblemContext) -> String {
    let mut parts = vec![format!(
        "You are helping debug a solution.\n\nProblem statement:\n{}",
        ctx.problem_statement
    )];
    if let Some(previous) = &ctx.previous_answer {
        parts.push(format!("Previous answer:\n{previous}"));
    }
    let headers = DebugSection::ALL
        .iter()
        .map(|s| format!("### {}", s.title()))
        .collect::<Vec<_>>()
        .join("\n");
    parts.push(format!(
        "The screenshots show the user's current code and any error output. \
         Respond using exactly these markdown headers:\n{headers}\n\
         Put corrected code in a fenced {lang} block under the improvements section.",
        lang = ctx.language
    ));
    parts.join("\n\n")
}
