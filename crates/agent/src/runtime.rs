use std::sync::Arc;

use tracing::info;

use frontdesk_core::journal::RecordSink;
use frontdesk_core::records::JournalRecord;

use crate::context::ContextAssembler;
use crate::conversation::Message;
use crate::prefilter::LeadPreFilter;
use crate::session::{AgentError, ConversationLoop};
use crate::tools::lead_acknowledgement;

/// Orchestrates one chat turn: deterministic lead capture first, the
/// model path second. The two strategies are deliberately redundant —
/// the pre-filter guarantees lead capture even when the model never
/// calls the recording tool.
pub struct AgentRuntime {
    assembler: ContextAssembler,
    prefilter: LeadPreFilter,
    conversation: ConversationLoop,
    sink: Arc<dyn RecordSink>,
    lead_followup: String,
}

impl AgentRuntime {
    pub fn new(
        assembler: ContextAssembler,
        conversation: ConversationLoop,
        sink: Arc<dyn RecordSink>,
        lead_followup: impl Into<String>,
    ) -> Self {
        Self {
            assembler,
            prefilter: LeadPreFilter,
            conversation,
            sink,
            lead_followup: lead_followup.into(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.conversation.backend_name()
    }

    /// Process one user message against the prior turns supplied by the
    /// chat surface and return the reply text.
    pub async fn handle_message(
        &self,
        user_text: &str,
        prior_turns: &[(String, String)],
    ) -> Result<String, AgentError> {
        if let Some(capture) = self.prefilter.try_extract(user_text) {
            self.sink.append(JournalRecord::lead(
                &capture.email,
                &capture.name,
                &capture.message,
            ))?;
            info!(
                event_name = "agent.prefilter.lead_captured",
                email = %capture.email,
                has_name = !capture.name.is_empty(),
                "lead captured deterministically; skipping the model for this turn"
            );
            let mut reply = lead_acknowledgement(&capture.email, &capture.name);
            reply.push_str(&self.lead_followup);
            return Ok(reply);
        }

        let mut history = self.assembler.initial_messages();
        for (user_message, assistant_message) in prior_turns {
            if !user_message.is_empty() {
                history.push(Message::user(user_message.clone()));
            }
            if !assistant_message.is_empty() {
                history.push(Message::assistant(assistant_message.clone()));
            }
        }
        history.push(Message::user(user_text));

        self.conversation.run_turn(history).await
    }
}
