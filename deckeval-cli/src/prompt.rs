//! Prompt construction for grading runs.
//!
//! The instruction pins the expected output shape. The extractor is
//! deliberately tolerant when models only half-comply.

/// Instruction line appended to every question.
pub const ANSWER_INSTRUCTION: &str =
    "Respond with exactly one line: The answer is N, where N is the index of the option you select.";

/// Build the user prompt for one case.
pub fn build_prompt(question: &str) -> String {
    format!("{question}\n\n{ANSWER_INSTRUCTION}")
}
