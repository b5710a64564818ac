//! Error types for deckeval-core

use thiserror::Error;

/// Errors related to interaction session lookup.
///
/// Grading failures never surface here: an unparsable or wrong answer is
/// expressed as a numeric score. The only fault class in the core is an
/// operation addressed to an instance id the registry does not hold.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("unknown interaction instance: {0}")]
    UnknownInstance(String),
}
