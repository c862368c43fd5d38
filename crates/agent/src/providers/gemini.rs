//! Gemini `generateContent` backend (variant B, the stricter one).
//!
//! Wire shape: system messages are combined into a single
//! `systemInstruction`; user/assistant turns become `contents` entries
//! (with the most recent entry acting as the current turn); tool
//! declarations travel as `functionDeclarations`; tool results are
//! replayed as `functionResponse` parts.
//!
//! Failure policy: known remote-access errors are recovered locally into
//! explanatory final answers instead of propagating. A missing model is
//! retried exactly once against `{model}-latest`; if the retry also
//! fails the answer names both attempted identifiers. Permission and
//! precondition failures, and any unclassified provider error, degrade
//! to a descriptive answer. The conversation loop never sees an error
//! from these classes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use frontdesk_core::config::LlmConfig;

use crate::conversation::{Message, ModelTurn, Role, ToolCall};
use crate::providers::{ChatBackend, ProviderError};
use crate::tools::ToolSpec;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiBackend {
    base_url: String,
    api_key: SecretString,
    model: String,
    client: reqwest::Client,
}

enum SendFailure {
    ModelNotFound,
    AccessDenied,
    Other(String),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<FunctionCallPart>,
}

#[derive(Debug, Deserialize)]
struct FunctionCallPart {
    name: String,
    #[serde(default)]
    args: Value,
}

impl GeminiBackend {
    pub fn from_config(llm: &LlmConfig) -> Result<Self, ProviderError> {
        let api_key = llm.api_key.clone().ok_or(ProviderError::MissingApiKey)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: llm
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: llm.effective_model(),
            client,
        })
    }

    async fn send(&self, model: &str, body: &Value) -> Result<ModelTurn, SendFailure> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);

        debug!(
            event_name = "agent.provider.request",
            provider = "gemini",
            model,
            "sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|error| SendFailure::Other(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|error| SendFailure::Other(format!("response decode failed: {error}")))?;

        Ok(interpret_response(parsed))
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn run_exchange(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn, ProviderError> {
        let body = build_request(history, tools);

        match self.send(&self.model, &body).await {
            Ok(turn) => Ok(turn),
            Err(SendFailure::ModelNotFound) => {
                let Some(alternate) = derive_alternate_model(&self.model) else {
                    return Ok(ModelTurn::Final(model_unavailable_message(&self.model, None)));
                };

                warn!(
                    event_name = "agent.provider.model_retry",
                    provider = "gemini",
                    model = %self.model,
                    alternate = %alternate,
                    "model not found; retrying once with derived identifier"
                );

                match self.send(&alternate, &body).await {
                    Ok(turn) => Ok(turn),
                    Err(_) => Ok(ModelTurn::Final(model_unavailable_message(
                        &self.model,
                        Some(&alternate),
                    ))),
                }
            }
            Err(SendFailure::AccessDenied) => Ok(ModelTurn::Final(
                "Gemini access issue. Check the configured API key permissions and model \
                 availability for your region and account."
                    .to_string(),
            )),
            Err(SendFailure::Other(detail)) => Ok(ModelTurn::Final(format!("Gemini error: {detail}"))),
        }
    }
}

fn classify_failure(status: u16, body: &str) -> SendFailure {
    if status == 404 || body.contains("NOT_FOUND") {
        return SendFailure::ModelNotFound;
    }
    if status == 403 || body.contains("PERMISSION_DENIED") || body.contains("FAILED_PRECONDITION") {
        return SendFailure::AccessDenied;
    }
    SendFailure::Other(format!("HTTP {status}: {body}"))
}

/// Alternate identifier for the single bounded retry. A model already
/// pinned to `-latest` has no further fallback.
fn derive_alternate_model(model: &str) -> Option<String> {
    if model.ends_with("-latest") {
        None
    } else {
        Some(format!("{model}-latest"))
    }
}

fn model_unavailable_message(model: &str, alternate: Option<&str>) -> String {
    match alternate {
        Some(alternate) => format!(
            "Gemini model '{model}' was not found, and the fallback '{alternate}' also failed. \
             Set llm.model to an available model (for example 'gemini-1.5-pro-latest')."
        ),
        None => format!(
            "Gemini model '{model}' was not found. Set llm.model to an available model \
             (for example 'gemini-1.5-pro-latest')."
        ),
    }
}

fn interpret_response(response: GenerateResponse) -> ModelTurn {
    let mut text = String::new();
    let mut calls = Vec::new();

    for candidate in response.candidates {
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            if let Some(part_text) = part.text {
                text.push_str(&part_text);
            }
            if let Some(function_call) = part.function_call {
                let arguments =
                    serde_json::to_string(&function_call.args).unwrap_or_else(|_| "{}".to_string());
                calls.push(ToolCall {
                    id: format!("call-{}", calls.len() + 1),
                    name: function_call.name,
                    arguments,
                });
            }
        }
    }

    if calls.is_empty() {
        ModelTurn::Final(text.trim().to_string())
    } else {
        ModelTurn::ToolRequests { content: text.trim().to_string(), calls }
    }
}

fn build_request(history: &[Message], tools: &[ToolSpec]) -> Value {
    let system_instruction = history
        .iter()
        .filter(|message| message.role == Role::System)
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    // Resolve tool-call ids back to function names: Gemini correlates
    // function responses by name, and the correlation invariant
    // guarantees the id was declared by a preceding assistant message.
    let mut call_names: HashMap<&str, &str> = HashMap::new();
    let mut contents = Vec::new();

    for message in history {
        match message.role {
            Role::System => {}
            Role::User => {
                contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": message.content }],
                }));
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                if !message.content.is_empty() {
                    parts.push(json!({ "text": message.content }));
                }
                for call in &message.tool_calls {
                    call_names.insert(call.id.as_str(), call.name.as_str());
                    let args: Value =
                        serde_json::from_str(&call.arguments).unwrap_or_else(|_| json!({}));
                    parts.push(json!({
                        "functionCall": { "name": call.name, "args": args },
                    }));
                }
                if parts.is_empty() {
                    parts.push(json!({ "text": "" }));
                }
                contents.push(json!({ "role": "model", "parts": parts }));
            }
            Role::Tool => {
                let name = message
                    .tool_call_id
                    .as_deref()
                    .and_then(|id| call_names.get(id).copied())
                    .unwrap_or_default();
                contents.push(json!({
                    "role": "user",
                    "parts": [{
                        "functionResponse": {
                            "name": name,
                            "response": { "result": message.content },
                        }
                    }],
                }));
            }
        }
    }

    let mut body = json!({
        "contents": contents,
        "systemInstruction": { "parts": [{ "text": system_instruction }] },
    });

    if !tools.is_empty() {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "description": spec.description,
                    "parameters": spec.parameters,
                })
            })
            .collect();
        body["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    body
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        build_request, derive_alternate_model, interpret_response, model_unavailable_message,
        GenerateResponse,
    };
    use crate::conversation::{Message, ModelTurn, ToolCall};
    use crate::tools::ToolSpec;

    #[test]
    fn alternate_model_is_derived_by_appending_latest() {
        assert_eq!(derive_alternate_model("demo-model").as_deref(), Some("demo-model-latest"));
        assert_eq!(derive_alternate_model("gemini-1.5-flash-latest"), None);
    }

    #[test]
    fn unavailable_message_names_both_attempted_identifiers() {
        let message = model_unavailable_message("demo-model", Some("demo-model-latest"));

        assert!(message.contains("demo-model"));
        assert!(message.contains("demo-model-latest"));
    }

    #[test]
    fn request_splits_system_messages_into_system_instruction() {
        let history = vec![
            Message::system("persona"),
            Message::system("trusted context"),
            Message::user("hello"),
        ];

        let body = build_request(&history, &[]);

        let instruction = body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .expect("system instruction should be text");
        assert!(instruction.contains("persona"));
        assert!(instruction.contains("trusted context"));

        let contents = body["contents"].as_array().expect("contents array");
        assert_eq!(contents.len(), 1, "system messages must not appear in contents");
        assert_eq!(contents[0]["role"], "user");
    }

    #[test]
    fn tool_results_are_replayed_as_function_responses_by_name() {
        let history = vec![
            Message::user("Do you ship overseas?"),
            Message::assistant_tool_calls(
                "",
                vec![ToolCall {
                    id: "call-1".to_string(),
                    name: "record_feedback".to_string(),
                    arguments: r#"{"question":"Do you ship overseas?"}"#.to_string(),
                }],
            ),
            Message::tool_result("call-1", "noted"),
        ];

        let body = build_request(&history, &[]);
        let contents = body["contents"].as_array().expect("contents array");

        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["name"], "record_feedback");
        assert_eq!(
            contents[1]["parts"][0]["functionCall"]["args"]["question"],
            "Do you ship overseas?"
        );

        let response_part = &contents[2]["parts"][0]["functionResponse"];
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(response_part["name"], "record_feedback");
        assert_eq!(response_part["response"]["result"], "noted");
    }

    #[test]
    fn tool_specs_become_function_declarations() {
        let specs = vec![ToolSpec {
            name: "record_feedback",
            description: "Log feedback.",
            parameters: json!({"type": "object", "properties": {}}),
        }];

        let body = build_request(&[Message::user("hi")], &specs);

        let declaration = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(declaration["name"], "record_feedback");
        assert_eq!(declaration["parameters"]["type"], "object");
    }

    #[test]
    fn function_call_parts_become_tool_requests_with_synthetic_ids() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "functionCall": { "name": "record_feedback", "args": { "question": "Q" } } },
                        { "functionCall": { "name": "record_customer_interest", "args": {} } }
                    ]
                }
            }]
        }))
        .expect("fixture should deserialize");

        let turn = interpret_response(response);

        let ModelTurn::ToolRequests { calls, .. } = turn else {
            panic!("expected tool requests");
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call-1");
        assert_eq!(calls[1].id, "call-2");
        assert_eq!(calls[0].name, "record_feedback");
        assert!(calls[0].arguments.contains("\"question\""));
    }

    #[test]
    fn text_only_response_is_a_final_answer() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "We ship worldwide. " }] }
            }]
        }))
        .expect("fixture should deserialize");

        assert_eq!(interpret_response(response), ModelTurn::Final("We ship worldwide.".to_string()));
    }
}
