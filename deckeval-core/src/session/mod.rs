//! Interaction session management

pub mod registry;
pub mod state;

// Re-export key types for convenience
pub use registry::SessionRegistry;
pub use state::{Session, SessionStatus, TurnOutcome, VERDICT_CORRECT, VERDICT_INCORRECT};
