//! OpenAI-compatible chat completion types.
//!
//! These are deliberately loose: every field defaults and unknown fields
//! are retained in flattened maps, so a parse/serialize round trip
//! preserves whatever the client or upstream sent. The proxy only needs
//! `stream`, the message texts, and `usage.total_tokens`; everything else
//! passes through.
//!
//! Reference: https://platform.openai.com/docs/api-reference/chat

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body for POST /v1/chat/completions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model ID (e.g., "gpt-4", "llama3.2:3b").
    #[serde(default)]
    pub model: String,

    /// Messages in the conversation.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,

    /// Enable streaming. Streaming requests bypass the cache.
    #[serde(default)]
    pub stream: bool,

    /// Any other request fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single chat message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", "assistant", "tool", ...
    #[serde(default)]
    pub role: String,

    /// Message content: plain text or a list of content parts.
    /// Null for assistant tool-call messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,

    /// Remaining message fields (name, tool_calls, ...), preserved.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Message content, either a string or an array of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One part of a multimodal message. Only parts carrying `text`
/// contribute to the cache key; the rest are preserved for forwarding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub part_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    /// The textual content of this message: the string itself, or the
    /// concatenation of the text parts in order. Non-text parts are
    /// skipped.
    pub fn text(&self) -> String {
        match &self.content {
            Some(MessageContent::Text(s)) => s.clone(),
            Some(MessageContent::Parts(parts)) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>(),
            None => String::new(),
        }
    }
}

/// Response from POST /v1/chat/completions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,

    /// Object type (always "chat.completion").
    #[serde(default)]
    pub object: String,

    /// Unix timestamp.
    #[serde(default)]
    pub created: u64,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default)]
    pub usage: Usage,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A completion choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,

    #[serde(default)]
    pub message: ChatMessage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let json = r#"{
            "model": "gpt-4",
            "messages": [
                {"role": "user", "content": "Hello!"}
            ]
        }"#;

        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert!(!request.stream);
        assert_eq!(request.messages[0].text(), "Hello!");
    }

    #[test]
    fn test_multimodal_content() {
        let json = r#"{
            "model": "gpt-4",
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "What is in "},
                    {"type": "image_url", "image_url": {"url": "https://example.com/a.png"}},
                    {"type": "text", "text": "this image?"}
                ]
            }]
        }"#;

        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.messages[0].text(), "What is in this image?");
    }

    #[test]
    fn test_passthrough_fields_preserved() {
        let json = r#"{
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": 0.7,
            "max_tokens": 128
        }"#;

        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.extra["temperature"], 0.7);

        let round_trip = serde_json::to_value(&request).unwrap();
        assert_eq!(round_trip["temperature"], 0.7);
        assert_eq!(round_trip["max_tokens"], 128);
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi there!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15},
            "system_fingerprint": "fp_abc"
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.id, "chatcmpl-123");
        assert_eq!(response.usage.total_tokens, 15);
        assert_eq!(response.choices[0].message.text(), "Hi there!");

        let round_trip = serde_json::to_value(&response).unwrap();
        assert_eq!(round_trip["system_fingerprint"], "fp_abc");
    }

    #[test]
    fn test_null_content_tool_message() {
        let json = r#"{
            "role": "assistant",
            "content": null,
            "tool_calls": [{"id": "call_1", "type": "function",
                            "function": {"name": "f", "arguments": "{}"}}]
        }"#;

        let message: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(message.content.is_none());
        assert_eq!(message.text(), "");
        assert!(message.extra.contains_key("tool_calls"));
    }
}
