//! Layered scoring of a model response against ground truth.
//!
//! A response earns a small *format* component for containing an
//! extractable answer at all, and a fixed *correctness* bonus when that
//! answer matches the ground truth. With the default weight the reachable
//! scores are exactly `{0.0, 0.1, 1.0}`.

use serde::{Deserialize, Serialize};

use crate::extract::{THINK_CLOSE, THINK_OPEN, extract};
use crate::types::GroundTruth;

/// Default portion of the score granted for an extractable answer.
pub const DEFAULT_FORMAT_WEIGHT: f64 = 0.1;

/// Fixed bonus added when the extracted answer matches the ground truth.
///
/// Deliberately a constant rather than `1.0 - format_weight`: with a
/// non-default weight the pre-clamp maximum is `format_weight + 0.9`.
pub const CORRECTNESS_BONUS: f64 = 0.9;

/// Scoring knobs, injected by the harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Weight of the format component.
    pub format_weight: f64,
    /// Require exactly one `<think>`/`</think>` pair in the response.
    pub enforce_format: bool,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            format_weight: DEFAULT_FORMAT_WEIGHT,
            enforce_format: false,
        }
    }
}

/// Score a model response against the ground truth.
///
/// Returns a value in `[0, 1]`:
///
/// - `0.0` when `enforce_format` is set and the reasoning markers are not
///   exactly one pair (correctness is never evaluated in that case);
/// - `0.0` when no answer can be extracted, regardless of format;
/// - `format_weight` for an extractable but wrong answer;
/// - `format_weight + 0.9`, clamped to `1.0`, for a correct answer.
///
/// A ground truth that does not cast to an integer makes correctness
/// false; the format floor still applies.
pub fn score(response: &str, ground_truth: &GroundTruth, config: &ScoreConfig) -> f64 {
    if config.enforce_format && !has_valid_format(response) {
        return 0.0;
    }

    let Some(extracted) = extract(response) else {
        return 0.0;
    };

    let mut total = config.format_weight;
    if ground_truth.answer_index() == Some(extracted) {
        total += CORRECTNESS_BONUS;
    }
    total.min(1.0)
}

/// Exactly one opening and one closing reasoning marker.
fn has_valid_format(response: &str) -> bool {
    response.matches(THINK_OPEN).count() == 1 && response.matches(THINK_CLOSE).count() == 1
}
