//! ModelClient trait
//!
//! The abstraction lets the harness swap the HTTP client for a scripted
//! mock in tests without touching the grading flow.

use async_trait::async_trait;

use deckeval_core::Message;

use crate::error::ClientError;
use crate::payload::{Capability, ImageAttachment};

/// A client that turns a conversation into one model response.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Request a completion for the conversation.
    ///
    /// Attachments are ignored by text-only clients. Returns the raw
    /// response text for grading.
    async fn complete(
        &self,
        messages: &[Message],
        attachments: &[ImageAttachment],
    ) -> Result<String, ClientError>;

    /// Whether this client sends images, fixed at construction.
    fn capability(&self) -> Capability;
}
