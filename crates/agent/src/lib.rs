//! Conversation runtime for the Frontdesk concierge.
//!
//! This crate drives a chat turn end to end:
//! 1. **Lead pre-filter** (`prefilter`) - deterministic email/name capture
//!    that records a lead without consulting the model
//! 2. **Context assembly** (`context`) - persona + trusted business
//!    knowledge as the two leading system messages
//! 3. **Conversation loop** (`session`) - the provider-agnostic
//!    tool-calling state machine, bounded by `max_tool_rounds`
//! 4. **Tool execution** (`tools`) - lead and feedback recorders writing
//!    through the append-only journal
//!
//! Model backends live in `providers`: an OpenAI-compatible Chat
//! Completions client and a Gemini `generateContent` client share the
//! `ChatBackend` contract and differ only in wire encoding and failure
//! policy. The backend is selected once from configuration, never
//! inspected per call.

pub mod context;
pub mod conversation;
pub mod prefilter;
pub mod providers;
pub mod runtime;
pub mod session;
pub mod tools;

pub use context::ContextAssembler;
pub use conversation::{Message, ModelTurn, Role, ToolCall};
pub use prefilter::{LeadCapture, LeadPreFilter};
pub use providers::{backend_from_config, ChatBackend, ProviderError};
pub use runtime::AgentRuntime;
pub use session::{AgentError, ConversationLoop};
pub use tools::{default_registry, RecordFeedbackTool, RecordLeadTool, Tool, ToolRegistry, ToolSpec};
