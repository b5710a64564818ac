//! Model API client for deckeval.
//!
//! Owns everything the grading core deliberately does not: connection
//! lifecycle, request timeouts, and retries. The core only ever sees the
//! raw response text this crate returns.
//!
//! Whether a client may attach images is a [`Capability`] fixed at
//! construction; [`build_payload`] is a pure function from a conversation
//! plus that flag to the wire request body, so no code path inspects
//! message shapes at runtime.

mod error;
mod http;
mod mock;
mod payload;
mod traits;

pub use error::ClientError;
pub use http::{HttpClientConfig, HttpModelClient};
pub use mock::MockModelClient;
pub use payload::{Capability, ImageAttachment, build_payload};
pub use traits::ModelClient;
