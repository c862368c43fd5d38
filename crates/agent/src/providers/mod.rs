pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

use frontdesk_core::config::{LlmConfig, LlmProvider};

use crate::conversation::{Message, ModelTurn};
use crate::tools::ToolSpec;

pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("llm.api_key is not configured")]
    MissingApiKey,
}

/// One request/response exchange with a model endpoint: send the full
/// conversation state plus tool declarations, receive either a final
/// answer or a batch of tool invocation requests.
///
/// The two implementations share this contract but differ in wire
/// encoding and failure policy: `OpenAiBackend` propagates provider
/// errors to the caller, `GeminiBackend` recovers known error classes
/// into explanatory final answers (with one bounded retry on a missing
/// model) and never errors out of the conversation loop for them.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run_exchange(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn, ProviderError>;
}

/// Select the backend once at session start from configuration. The
/// provider choice is never re-inspected per call.
pub fn backend_from_config(llm: &LlmConfig) -> Result<Box<dyn ChatBackend>, ProviderError> {
    match llm.provider {
        LlmProvider::OpenAi => Ok(Box::new(OpenAiBackend::from_config(llm)?)),
        LlmProvider::Gemini => Ok(Box::new(GeminiBackend::from_config(llm)?)),
    }
}
