//! Option-index extraction from raw model output.
//!
//! Models are instructed to answer "The answer is N", but in practice emit
//! anything from exact compliance to a paragraph of reasoning ending in a
//! bare number. The extractor is an ordered chain of matcher strategies
//! evaluated with first-success short-circuit:
//!
//! 1. explicit answer patterns in the segment after the last `</think>`;
//! 2. explicit answer patterns anywhere in the text;
//! 3. the last standalone integer in the answer segment;
//! 4. the last standalone integer anywhere in the text.
//!
//! Priority is by pattern *type*, not by position: "answer is 2" beats
//! "option 5" even when "option 5" appears later. Scanning the
//! closing-marker-trimmed segment first keeps stray numbers inside the
//! reasoning block from shadowing the actual answer.

use std::sync::LazyLock;

use regex::Regex;

/// Opening marker of an optional reasoning block.
pub const THINK_OPEN: &str = "<think>";

/// Closing marker of an optional reasoning block.
pub const THINK_CLOSE: &str = "</think>";

/// Explicit answer statements, in priority order. The first pattern type
/// with at least one match wins; the last match of that type is taken.
const EXPLICIT_PATTERNS: &[&str] = &[
    r"(?i)answer is (\d+)",
    r"(?i)option (\d+)",
    r"(?i)choose (\d+)",
    r"(?i)select (\d+)",
];

static DEFAULT_EXTRACTOR: LazyLock<AnswerExtractor> = LazyLock::new(AnswerExtractor::new);

/// Extract the selected option index from raw model output.
///
/// Returns `None` when the text contains no integer at all. Pure and
/// deterministic; repeated calls on the same input agree.
pub fn extract(text: &str) -> Option<i64> {
    DEFAULT_EXTRACTOR.extract(text)
}

/// Compiled matcher chain behind [`extract`].
///
/// Owning an instance is only useful to avoid the shared static in
/// benchmarks or tests; the chain itself is fixed.
pub struct AnswerExtractor {
    explicit: Vec<Regex>,
    integer: Regex,
}

impl AnswerExtractor {
    pub fn new() -> Self {
        Self {
            explicit: EXPLICIT_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("static pattern compiles"))
                .collect(),
            integer: Regex::new(r"\d+").expect("static pattern compiles"),
        }
    }

    /// Run the full fallback chain over `text`.
    pub fn extract(&self, text: &str) -> Option<i64> {
        if text.is_empty() {
            return None;
        }
        let segment = answer_segment(text);

        self.last_explicit(segment)
            .or_else(|| self.last_explicit(text))
            .or_else(|| self.last_integer(segment))
            .or_else(|| self.last_integer(text))
    }

    /// First explicit pattern type with a match in `text`, taking the last
    /// match of that type.
    fn last_explicit(&self, text: &str) -> Option<i64> {
        for pattern in &self.explicit {
            let last = pattern
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .filter_map(|m| m.as_str().parse().ok())
                .last();
            if last.is_some() {
                return last;
            }
        }
        None
    }

    /// Last standalone integer literal in `text`.
    fn last_integer(&self, text: &str) -> Option<i64> {
        self.integer
            .find_iter(text)
            .filter_map(|m| m.as_str().parse().ok())
            .last()
    }
}

impl Default for AnswerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// The search region preferred by the extractor: everything after the last
/// closing reasoning marker, or the whole text when no marker is present.
fn answer_segment(text: &str) -> &str {
    match text.rsplit_once(THINK_CLOSE) {
        Some((_, after)) => after,
        None => text,
    }
}
