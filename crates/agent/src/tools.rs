use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use frontdesk_core::journal::RecordSink;
use frontdesk_core::records::JournalRecord;

/// Declaration of a tool exposed to the model: name, description, and a
/// JSON-Schema object for its parameters. Immutable after startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Execute with already-parsed arguments. Missing keys default to
    /// empty strings inside the handler.
    async fn execute(&self, arguments: &Value) -> Result<String>;
}

/// Executes tools by name on the model's behalf. The contract with the
/// conversation loop is that `execute` always yields a text result: the
/// provider protocol requires a correlated result message for every call
/// it issued, so an unknown name or a failed handler becomes a tagged
/// text result instead of an error.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.spec().name, Box::new(tool));
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|tool| tool.spec()).collect();
        specs.sort_by_key(|spec| spec.name);
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn execute(&self, name: &str, raw_arguments: &str) -> String {
        let Some(tool) = self.tools.get(name) else {
            return format!("Unknown tool: {name}");
        };

        let arguments = parse_arguments(raw_arguments);
        match tool.execute(&arguments).await {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    tool_name = name,
                    error = %error,
                    "tool handler failed; returning text result to keep the protocol intact"
                );
                format!("Tool {name} failed: {error}")
            }
        }
    }
}

/// Malformed argument payloads degrade to an empty-argument call rather
/// than aborting the turn.
fn parse_arguments(raw_arguments: &str) -> Value {
    match serde_json::from_str::<Value>(raw_arguments) {
        Ok(value @ Value::Object(_)) => value,
        _ => json!({}),
    }
}

fn string_argument(arguments: &Value, key: &str) -> String {
    arguments.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Records a prospective customer's contact details for follow-up.
pub struct RecordLeadTool {
    sink: Arc<dyn RecordSink>,
}

impl RecordLeadTool {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Tool for RecordLeadTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "record_customer_interest",
            description: "Record a potential customer's contact details and message for follow-up.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "Customer email" },
                    "name": { "type": "string", "description": "Customer name" },
                    "message": { "type": "string", "description": "A short note about their interest" }
                },
                "required": ["email", "name"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> Result<String> {
        let email = string_argument(arguments, "email");
        let name = string_argument(arguments, "name");
        let message = string_argument(arguments, "message");

        self.sink.append(JournalRecord::lead(&email, &name, &message))?;
        Ok(lead_acknowledgement(&email, &name))
    }
}

/// Logs feedback or an unanswered question so a human can respond.
pub struct RecordFeedbackTool {
    sink: Arc<dyn RecordSink>,
}

impl RecordFeedbackTool {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Tool for RecordFeedbackTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "record_feedback",
            description: "Log customer feedback or an unanswered question so a human can respond.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": { "type": "string", "description": "The feedback or unanswered question" }
                },
                "required": ["question"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> Result<String> {
        let question = string_argument(arguments, "question");

        self.sink.append(JournalRecord::feedback(&question))?;
        Ok("Thanks! I've noted that for the team and will follow up.".to_string())
    }
}

pub fn lead_acknowledgement(email: &str, name: &str) -> String {
    if name.trim().is_empty() {
        format!("Thanks! We've recorded your interest. We'll reach out at {email}.")
    } else {
        format!("Thanks, {name}! We've recorded your interest. We'll reach out at {email}.")
    }
}

/// The registry every session starts with: both recording tools wired to
/// the shared journal sink.
pub fn default_registry(sink: Arc<dyn RecordSink>) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    registry.register(RecordLeadTool::new(sink.clone()));
    registry.register(RecordFeedbackTool::new(sink));
    registry
}
