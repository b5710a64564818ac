//! Request payload construction.
//!
//! [`build_payload`] is a pure mapping from (messages, attachments,
//! capability) to an OpenAI-style chat-completions body. The capability is
//! decided once when the client is constructed; text-only payloads are
//! plain strings, multimodal payloads carry structured content parts.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use deckeval_core::{Content, ContentPart, Message, Role};

/// What a client is allowed to put on the wire, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Plain string message content only; attachments are dropped.
    TextOnly,
    /// Structured content parts with embedded images.
    Multimodal,
}

/// An image already read and encoded by the harness.
///
/// Kept as data rather than a path so payload construction stays pure;
/// file I/O happens in the harness during dataset preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// MIME type, e.g. `image/png`.
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub base64: String,
}

/// Map a conversation to a chat-completions request body.
///
/// Attachments are appended to the last user message as image parts when
/// the capability allows it; a [`Capability::TextOnly`] client emits the
/// same conversation with attachments dropped. Pure and deterministic.
pub fn build_payload(
    model: &str,
    messages: &[Message],
    attachments: &[ImageAttachment],
    capability: Capability,
) -> Value {
    let last_user = messages.iter().rposition(|m| m.role == Role::User);

    let wire_messages: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            let attach = capability == Capability::Multimodal
                && !attachments.is_empty()
                && Some(i) == last_user;
            json!({
                "role": role_name(message.role),
                "content": wire_content(&message.content, if attach { attachments } else { &[] }),
            })
        })
        .collect();

    json!({
        "model": model,
        "messages": wire_messages,
    })
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn wire_content(content: &Content, attachments: &[ImageAttachment]) -> Value {
    if attachments.is_empty() {
        // Text-only wire shape: a plain string.
        return Value::String(content.as_text());
    }

    let mut parts = vec![json!({ "type": "text", "text": content.as_text() })];
    for attachment in attachments {
        parts.push(json!({
            "type": "image_url",
            "image_url": {
                "url": format!(
                    "data:{};base64,{}",
                    attachment.media_type, attachment.base64
                ),
            },
        }));
    }
    Value::Array(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(data: &str) -> ImageAttachment {
        ImageAttachment {
            media_type: "image/png".to_string(),
            base64: data.to_string(),
        }
    }

    #[test]
    fn text_only_payload_uses_plain_strings() {
        let messages = [Message::user("Which option wins?")];
        let payload = build_payload("gpt-test", &messages, &[png("AAAA")], Capability::TextOnly);

        assert_eq!(payload["model"], "gpt-test");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"], "Which option wins?");
    }

    #[test]
    fn multimodal_payload_attaches_to_last_user_message() {
        let messages = [
            Message::system("You grade puzzles."),
            Message::user("Which option wins?"),
        ];
        let payload = build_payload("gpt-test", &messages, &[png("AAAA")], Capability::Multimodal);

        // System message stays a plain string.
        assert_eq!(payload["messages"][0]["content"], "You grade puzzles.");

        let parts = payload["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn multimodal_without_attachments_stays_plain() {
        let messages = [Message::user("Which option wins?")];
        let payload = build_payload("gpt-test", &messages, &[], Capability::Multimodal);
        assert_eq!(payload["messages"][0]["content"], "Which option wins?");
    }

    #[test]
    fn payload_mapping_is_deterministic() {
        let messages = [Message::user("q")];
        let attachments = [png("BBBB")];
        let a = build_payload("m", &messages, &attachments, Capability::Multimodal);
        let b = build_payload("m", &messages, &attachments, Capability::Multimodal);
        assert_eq!(a, b);
    }
}
