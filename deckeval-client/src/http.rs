//! OpenAI-compatible HTTP model client.
//!
//! All suspension around obtaining a model response lives here: request
//! timeout, bounded retries with linear backoff. The grading core never
//! sees any of it.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use deckeval_core::Message;

use crate::error::ClientError;
use crate::payload::{Capability, ImageAttachment, build_payload};
use crate::traits::ModelClient;

/// Construction-time settings for [`HttpModelClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Chat-completions endpoint, e.g. `https://api.example.com/v1/chat/completions`.
    pub api_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model name sent in the request body.
    pub model: String,
    /// Whether image attachments go on the wire.
    pub capability: Capability,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts per completion (1 = no retries).
    pub max_attempts: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            model: String::new(),
            capability: Capability::TextOnly,
            timeout: Duration::from_secs(120),
            max_attempts: 3,
        }
    }
}

/// Response body of a chat-completions call, reduced to what grading needs.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Model client speaking the OpenAI chat-completions protocol.
pub struct HttpModelClient {
    http: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpModelClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    async fn request_once(&self, body: &serde_json::Value) -> Result<String, ClientError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClientError::MalformedResponse("no choices in response".to_string()))
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(
        &self,
        messages: &[Message],
        attachments: &[ImageAttachment],
    ) -> Result<String, ClientError> {
        let body = build_payload(
            &self.config.model,
            messages,
            attachments,
            self.config.capability,
        );

        let attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.request_once(&body).await {
                Ok(text) => {
                    debug!(model = %self.config.model, attempt, "completion received");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(model = %self.config.model, attempt, error = %e, "completion attempt failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                    }
                }
            }
        }

        Err(ClientError::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    fn capability(&self) -> Capability {
        self.config.capability
    }
}
