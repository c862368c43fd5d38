use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry in the ordered conversation history. Order is causal and
/// must be preserved exactly, including the interleaving of assistant
/// tool-call messages and the tool-result messages that answer them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Assistant message recording the tool invocations a model response
    /// requested. Kept verbatim so the exchange can be replayed to the
    /// provider with the original call ids and argument encodings.
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// Tool-result message correlated to its request by `tool_call_id`.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// A tool invocation requested by the model. `arguments` holds the raw
/// JSON text exactly as the provider produced it; parsing happens at
/// execution time and parse failures degrade rather than abort.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Outcome of one request/response exchange with a backend: either the
/// final answer for the turn, or a batch of tool invocations to execute
/// before asking again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelTurn {
    Final(String),
    ToolRequests { content: String, calls: Vec<ToolCall> },
}

#[cfg(test)]
mod tests {
    use super::{Message, Role, ToolCall};

    #[test]
    fn tool_result_carries_correlating_id() {
        let message = Message::tool_result("call-1", "done");
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call-1"));
        assert!(message.tool_calls.is_empty());
    }

    #[test]
    fn assistant_tool_call_message_preserves_raw_argument_text() {
        let raw_arguments = r#"{"email":"a@b.co","name":"A"}"#;
        let message = Message::assistant_tool_calls(
            "",
            vec![ToolCall {
                id: "call-7".to_string(),
                name: "record_customer_interest".to_string(),
                arguments: raw_arguments.to_string(),
            }],
        );

        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].arguments, raw_arguments);
    }
}
