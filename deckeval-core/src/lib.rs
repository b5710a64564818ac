//! Core grading logic for deckeval.
//!
//! This crate turns a model's free-text answer to a single-choice puzzle
//! question into a reward in `[0, 1]` and mediates the one-shot grading
//! conversation around it:
//!
//! - **Extraction** ([`extract`]) parses an option index out of raw model
//!   text with an ordered fallback chain.
//! - **Scoring** ([`score`]) layers a format component and a correctness
//!   component on top of extraction.
//! - **Sessions** ([`SessionRegistry`]) hold per-task-instance state for
//!   the start → respond → finalize lifecycle, safe under concurrent use.
//!
//! Extraction and scoring are pure functions; a wrong or unparsable answer
//! is a score outcome, never an error. The only fault this crate raises is
//! [`SessionError::UnknownInstance`] for operations on an instance id that
//! does not exist.

mod error;
mod extract;
mod score;
pub mod session;
mod types;

pub use error::SessionError;

pub use extract::{AnswerExtractor, THINK_CLOSE, THINK_OPEN, extract};

pub use score::{CORRECTNESS_BONUS, DEFAULT_FORMAT_WEIGHT, ScoreConfig, score};

pub use session::{Session, SessionRegistry, SessionStatus, TurnOutcome};

pub use types::{Content, ContentPart, GroundTruth, Message, Role};
