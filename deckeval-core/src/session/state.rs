//! Session struct and state machine
//!
//! A session holds the ground truth for one task instance and records the
//! model's single graded turn. The protocol is strictly single-turn: the
//! first recorded response terminates the session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::score::{ScoreConfig, score};
use crate::types::{GroundTruth, Message, Role};

/// Verdict returned for a fully-correct response.
pub const VERDICT_CORRECT: &str = "Correct!";

/// Verdict returned for anything less than a full score.
pub const VERDICT_INCORRECT: &str = "Incorrect.";

/// State of an interaction session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Started, no response graded yet.
    Active,
    /// A response has been recorded and graded.
    Terminated,
}

/// Result of grading one conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Whether the interaction should end. Always true here: the protocol
    /// is single-turn regardless of reward.
    pub terminate: bool,
    /// Verdict text for the harness ("Correct!" / "Incorrect.").
    pub message: String,
    /// Reward in `[0, 1]`.
    pub reward: f64,
    /// Extra data for the harness; currently always empty.
    pub metadata: Map<String, Value>,
}

/// Per-task-instance grading state.
///
/// Owned exclusively by the [`SessionRegistry`](super::SessionRegistry)
/// for its lifetime; nothing outside the registry mutates one.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    ground_truth: GroundTruth,
    last_response: String,
    reward: f64,
    status: SessionStatus,
}

impl Session {
    pub fn new(id: impl Into<String>, ground_truth: GroundTruth) -> Self {
        Self {
            id: id.into(),
            ground_truth,
            last_response: String::new(),
            reward: 0.0,
            status: SessionStatus::Active,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ground_truth(&self) -> &GroundTruth {
        &self.ground_truth
    }

    /// The response text graded by the most recent turn.
    pub fn last_response(&self) -> &str {
        &self.last_response
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Record and grade the model's turn from a conversation.
    ///
    /// The conversation is scanned backward for the most recent
    /// assistant-authored message; its text becomes the session's response
    /// (empty when none is found, which scores 0.0). Calling this again on
    /// a terminated session re-records and re-scores idempotently.
    pub fn record_turn(&mut self, messages: &[Message], config: &ScoreConfig) -> TurnOutcome {
        self.last_response = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_text())
            .unwrap_or_default();

        self.reward = score(&self.last_response, &self.ground_truth, config);
        self.status = SessionStatus::Terminated;

        let message = if self.reward >= 1.0 {
            VERDICT_CORRECT
        } else {
            VERDICT_INCORRECT
        };

        TurnOutcome {
            terminate: true,
            message: message.to_string(),
            reward: self.reward,
            metadata: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ScoreConfig {
        ScoreConfig::default()
    }

    #[test]
    fn new_session_starts_active_with_zero_reward() {
        let session = Session::new("inst-1", GroundTruth::new(3));
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.reward(), 0.0);
        assert_eq!(session.last_response(), "");
        assert_eq!(session.id(), "inst-1");
    }

    #[test]
    fn correct_turn_terminates_with_full_reward() {
        let mut session = Session::new("inst-1", GroundTruth::new(3));
        let outcome = session.record_turn(&[Message::assistant("The answer is 3")], &defaults());

        assert!(outcome.terminate);
        assert_eq!(outcome.message, VERDICT_CORRECT);
        assert!((outcome.reward - 1.0).abs() < f64::EPSILON);
        assert!(outcome.metadata.is_empty());
        assert_eq!(session.status(), SessionStatus::Terminated);
        assert_eq!(session.last_response(), "The answer is 3");
    }

    #[test]
    fn wrong_turn_terminates_with_format_reward() {
        let mut session = Session::new("inst-1", GroundTruth::new(4));
        let outcome = session.record_turn(&[Message::assistant("The answer is 3")], &defaults());

        assert!(outcome.terminate);
        assert_eq!(outcome.message, VERDICT_INCORRECT);
        assert!((outcome.reward - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn most_recent_assistant_message_is_graded() {
        let mut session = Session::new("inst-1", GroundTruth::new(2));
        let conversation = [
            Message::user("Which option wins?"),
            Message::assistant("The answer is 5"),
            Message::user("Are you sure?"),
            Message::assistant("Actually, the answer is 2"),
        ];
        let outcome = session.record_turn(&conversation, &defaults());
        assert!((outcome.reward - 1.0).abs() < f64::EPSILON);
        assert_eq!(session.last_response(), "Actually, the answer is 2");
    }

    #[test]
    fn no_assistant_message_scores_zero_and_terminates() {
        let mut session = Session::new("inst-1", GroundTruth::new(2));
        let conversation = [Message::user("Which option wins?")];
        let outcome = session.record_turn(&conversation, &defaults());

        assert!(outcome.terminate);
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(outcome.message, VERDICT_INCORRECT);
        assert_eq!(session.last_response(), "");
    }

    #[test]
    fn second_turn_rescores_idempotently() {
        let mut session = Session::new("inst-1", GroundTruth::new(2));
        let conversation = [Message::assistant("The answer is 2")];

        let first = session.record_turn(&conversation, &defaults());
        let second = session.record_turn(&conversation, &defaults());

        assert_eq!(first.reward, second.reward);
        assert_eq!(first.message, second.message);
        assert_eq!(session.status(), SessionStatus::Terminated);
    }

    #[test]
    fn session_status_serialization_roundtrip() {
        for status in [SessionStatus::Active, SessionStatus::Terminated] {
            let json = serde_json::to_string(&status).unwrap();
            let parsed: SessionStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, parsed);
        }
    }
}
