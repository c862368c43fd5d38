//! OpenAI-compatible Chat Completions backend (variant A, the default).
//!
//! Also serves any OpenAI-compatible endpoint via `llm.base_url`.
//! Transport and API failures propagate to the caller as errors for the
//! turn; this backend performs no local recovery.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use frontdesk_core::config::LlmConfig;

use crate::conversation::{Message, ModelTurn, Role, ToolCall};
use crate::providers::{ChatBackend, ProviderError};
use crate::tools::ToolSpec;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiBackend {
    base_url: String,
    api_key: SecretString,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolPayload<'a>>>,
    tool_choice: &'a str,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'a str,
    function: FunctionPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionPayload<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ToolCallPayload {
    id: String,
    r#type: String,
    function: FunctionCallPayload,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct FunctionCallPayload {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

impl OpenAiBackend {
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

    fn build_request<'a>(
        &'a self,
        history: &[Message],
        tools: &'a [ToolSpec],
    ) -> ChatRequest<'a> {
        let messages = history
            .iter()
            .map(|message| match message.role {
                Role::System => MessagePayload {
                    role: "system",
                    content: message.content.clone(),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Role::User => MessagePayload {
                    role: "user",
                    content: message.content.clone(),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Role::Assistant => MessagePayload {
                    role: "assistant",
                    content: message.content.clone(),
                    tool_calls: if message.tool_calls.is_empty() {
                        None
                    } else {
                        Some(
                            message
                                .tool_calls
                                .iter()
                                .map(|call| ToolCallPayload {
                                    id: call.id.clone(),
                                    r#type: "function".to_string(),
                                    function: FunctionCallPayload {
                                        name: call.name.clone(),
                                        arguments: call.arguments.clone(),
                                    },
                                })
                                .collect(),
                        )
                    },
                    tool_call_id: None,
                },
                Role::Tool => MessagePayload {
                    role: "tool",
                    content: message.content.clone(),
                    tool_calls: None,
                    tool_call_id: message.tool_call_id.clone(),
                },
            })
            .collect();

        let tool_payloads = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|spec| ToolPayload {
                        r#type: "function",
                        function: FunctionPayload {
                            name: spec.name,
                            description: spec.description,
                            parameters: &spec.parameters,
                        },
                    })
                    .collect(),
            )
        };

        ChatRequest {
            model: &self.model,
            messages,
            tools: tool_payloads,
            tool_choice: "auto",
            temperature: 0.5,
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn run_exchange(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = self.build_request(history, tools);

        debug!(
            event_name = "agent.provider.request",
            provider = "openai",
            model = %self.model,
            message_count = history.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status: status.as_u16(), body });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|error| ProviderError::Decode(error.to_string()))?;

        let Some(choice) = body.choices.into_iter().next() else {
            return Err(ProviderError::Decode("response contained no choices".to_string()));
        };

        let content = choice.message.content.unwrap_or_default();
        if choice.message.tool_calls.is_empty() {
            return Ok(ModelTurn::Final(content));
        }

        let calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(ModelTurn::ToolRequests { content, calls })
    }
}
