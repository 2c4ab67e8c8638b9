use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A content part exactly as it was handed to the store.
///
/// Parts are kept as raw JSON objects so that provider-specific fields
/// (cache hints, reasoning signatures, ...) survive a save/load round trip.
pub type RawPart = Map<String, Value>;

/// Message content: either plain text or a list of content parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),

    /// Multipart content (text, tool calls, tool results, anything else)
    Parts(Vec<RawPart>),
}

/// Typed view over the content parts the store knows how to read.
///
/// Anything else is still accepted in [`MessageContent::Parts`], it just has
/// no typed representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    Text {
        text: String,
    },

    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        input: Value,
    },

    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        output: Value,
    },
}

impl ContentPart {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool-call part
    pub fn tool_call(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Self {
        Self::ToolCall {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            input,
        }
    }

    /// Create a tool-result part
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: Value,
    ) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            output,
        }
    }

    /// Try to read a raw part as one of the known part types
    pub fn from_raw(raw: &RawPart) -> Option<Self> {
        serde_json::from_value(Value::Object(raw.clone())).ok()
    }
}

impl From<ContentPart> for RawPart {
    fn from(part: ContentPart) -> Self {
        match serde_json::to_value(part) {
            Ok(Value::Object(map)) => map,
            _ => RawPart::new(),
        }
    }
}

impl MessageContent {
    /// Create text content
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Create multipart content from typed parts
    pub fn parts(parts: impl IntoIterator<Item = ContentPart>) -> Self {
        Self::Parts(parts.into_iter().map(RawPart::from).collect())
    }

    /// Get as plain text (if possible)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Parts(parts) => {
                // A single text part reads as plain text
                if let [part] = parts.as_slice() {
                    if part.get("type").and_then(Value::as_str) == Some("text") {
                        return part.get("text").and_then(Value::as_str);
                    }
                }
                None
            }
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_part_wire_shape() {
        let raw = RawPart::from(ContentPart::tool_call("call-1", "ToolA", json!({"hello": "world"})));

        assert_eq!(
            Value::Object(raw),
            json!({
                "type": "tool-call",
                "toolCallId": "call-1",
                "toolName": "ToolA",
                "input": {"hello": "world"}
            })
        );
    }

    #[test]
    fn test_unknown_part_has_no_typed_view() {
        let raw = json!({"type": "image", "image": "data:..."});
        let Value::Object(raw) = raw else { unreachable!() };

        assert_eq!(ContentPart::from_raw(&raw), None);
    }

    #[test]
    fn test_single_text_part_as_text() {
        let content = MessageContent::parts([ContentPart::text("hi")]);
        assert_eq!(content.as_text(), Some("hi"));

        let content = MessageContent::parts([ContentPart::text("a"), ContentPart::text("b")]);
        assert_eq!(content.as_text(), None);
    }

    #[test]
    fn test_content_rejects_non_object_parts() {
        let result: Result<MessageContent, _> = serde_json::from_value(json!([1, 2, 3]));
        assert!(result.is_err());
    }
}
