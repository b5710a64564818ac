//! Error types for deckeval-client

use thiserror::Error;

/// Errors from model API clients.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("no scripted response queued in mock client")]
    NoScriptedResponse,
}
