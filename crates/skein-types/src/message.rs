use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::content::{ContentPart, MessageContent};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversational turn as produced by the model-call layer.
///
/// The store never interprets this beyond the role; `content` parts and any
/// extra top-level fields are persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: MessageRole,
    pub content: MessageContent,

    /// Provider-specific fields we don't model (e.g. `providerOptions`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelMessage {
    pub fn new(role: MessageRole, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
            extra: Map::new(),
        }
    }

    /// Create system message
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create user message
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create assistant message
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create tool message
    pub fn tool(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::Tool, content)
    }

    /// Create a message from typed content parts
    pub fn with_parts(role: MessageRole, parts: impl IntoIterator<Item = ContentPart>) -> Self {
        Self::new(role, MessageContent::parts(parts))
    }

    /// Attach an extra top-level field
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        self.role.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization_user() {
        let msg = ModelMessage::user("Hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let raw = json!({
            "role": "assistant",
            "content": [
                {"type": "reasoning", "text": "thinking", "signature": "abc"},
                {"type": "text", "text": "done"}
            ],
            "providerOptions": {"anthropic": {"cacheControl": {"type": "ephemeral"}}}
        });

        let msg: ModelMessage = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(msg.extra.contains_key("providerOptions"));
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result: Result<ModelMessage, _> =
            serde_json::from_value(json!({"role": "narrator", "content": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_content_rejected() {
        let result: Result<ModelMessage, _> = serde_json::from_value(json!({"role": "user"}));
        assert!(result.is_err());
    }
}
