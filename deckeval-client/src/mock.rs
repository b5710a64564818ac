//! Mock model client for testing
//!
//! Queue responses with [`MockModelClient::queue_response`] before running;
//! each `complete()` consumes one. Enables fast, deterministic testing of
//! the grading flow without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use deckeval_core::Message;

use crate::error::ClientError;
use crate::payload::{Capability, ImageAttachment};
use crate::traits::ModelClient;

/// Scriptable [`ModelClient`] that replays queued responses in FIFO order.
pub struct MockModelClient {
    responses: Mutex<VecDeque<Result<String, ClientError>>>,
    capability: Capability,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            capability: Capability::TextOnly,
        }
    }

    pub fn with_capability(capability: Capability) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            capability,
        }
    }

    /// Queue a response to be returned by the next `complete()`.
    pub fn queue_response(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(text.into()));
    }

    /// Queue an error for the next `complete()`.
    pub fn queue_error(&self, error: ClientError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Number of responses still queued.
    pub fn queued_count(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(
        &self,
        _messages: &[Message],
        _attachments: &[ImageAttachment],
    ) -> Result<String, ClientError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ClientError::NoScriptedResponse))
    }

    fn capability(&self) -> Capability {
        self.capability
    }
}
