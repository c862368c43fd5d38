use thiserror::Error;
use tracing::{info, warn};

use frontdesk_core::journal::JournalError;

use crate::conversation::{Message, ModelTurn};
use crate::providers::{ChatBackend, ProviderError};
use crate::tools::ToolRegistry;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Journal(#[from] JournalError),
}

/// Answer used when the model keeps requesting tools past the configured
/// round bound. The turn resolves with this text instead of blocking
/// forever or surfacing an internal error.
const ROUND_LIMIT_ANSWER: &str = "I wasn't able to finish handling that request. Please try \
                                  rephrasing, or share your name and email and the team will \
                                  follow up directly.";

/// The provider-agnostic tool-calling state machine.
///
/// Each turn starts in `AwaitingModel` with the assembled history. A
/// response carrying tool requests moves the turn through
/// `ExecutingTools`: the assistant message is appended verbatim (ids,
/// names, raw argument text), every requested call is executed in the
/// order received, and each result is appended as a correlated
/// tool-role message before the extended history is resent. A response
/// with no tool requests is the final answer.
pub struct ConversationLoop {
    backend: Box<dyn ChatBackend>,
    registry: ToolRegistry,
    max_tool_rounds: u32,
}

impl ConversationLoop {
    pub fn new(backend: Box<dyn ChatBackend>, registry: ToolRegistry, max_tool_rounds: u32) -> Self {
        Self { backend, registry, max_tool_rounds }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn run_turn(&self, mut history: Vec<Message>) -> Result<String, AgentError> {
        let specs = self.registry.specs();
        let mut rounds_executed = 0u32;

        loop {
            let turn = self.backend.run_exchange(&history, &specs).await?;

            let (content, calls) = match turn {
                ModelTurn::Final(text) => return Ok(text),
                ModelTurn::ToolRequests { content, calls } => (content, calls),
            };

            if rounds_executed >= self.max_tool_rounds {
                warn!(
                    event_name = "agent.loop.round_limit",
                    backend = self.backend.name(),
                    max_tool_rounds = self.max_tool_rounds,
                    pending_calls = calls.len(),
                    "model kept requesting tools past the round bound; degrading the turn"
                );
                return Ok(ROUND_LIMIT_ANSWER.to_string());
            }
            rounds_executed += 1;

            history.push(Message::assistant_tool_calls(content, calls.clone()));

            for call in &calls {
                info!(
                    event_name = "agent.loop.tool_call",
                    backend = self.backend.name(),
                    tool_name = %call.name,
                    call_id = %call.id,
                    round = rounds_executed,
                    "executing requested tool"
                );
                let result = self.registry.execute(&call.name, &call.arguments).await;
                history.push(Message::tool_result(call.id.clone(), result));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use frontdesk_core::journal::InMemorySink;
    use frontdesk_core::records::JournalRecord;

    use super::ConversationLoop;
    use crate::conversation::{Message, ModelTurn, Role, ToolCall};
    use crate::providers::{ChatBackend, ProviderError};
    use crate::tools::{default_registry, ToolSpec};

    /// Backend double that replays a fixed script of exchanges and keeps
    /// every history snapshot it was sent.
    struct ScriptedBackend {
        script: Mutex<VecDeque<ModelTurn>>,
        observed_histories: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedBackend {
        fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                script: Mutex::new(turns.into()),
                observed_histories: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn run_exchange(
            &self,
            history: &[Message],
            _tools: &[ToolSpec],
        ) -> Result<ModelTurn, ProviderError> {
            self.observed_histories
                .lock()
                .expect("history lock")
                .push(history.to_vec());
            let turn = self
                .script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or(ModelTurn::Final("script exhausted".to_string()));
            Ok(turn)
        }
    }

    fn feedback_call(id: &str, question: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "record_feedback".to_string(),
            arguments: format!(r#"{{"question":"{question}"}}"#),
        }
    }

    fn conversation_loop(
        turns: Vec<ModelTurn>,
        sink: Arc<InMemorySink>,
        max_tool_rounds: u32,
    ) -> (ConversationLoop, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new(turns));
        let registry = default_registry(sink);
        let conversation = ConversationLoop::new(
            Box::new(SharedBackend(backend.clone())),
            registry,
            max_tool_rounds,
        );
        (conversation, backend)
    }

    /// Allows the test to keep a handle on the scripted backend after it
    /// moves into the loop.
    struct SharedBackend(Arc<ScriptedBackend>);

    #[async_trait]
    impl ChatBackend for SharedBackend {
        fn name(&self) -> &'static str {
            self.0.name()
        }

        async fn run_exchange(
            &self,
            history: &[Message],
            tools: &[ToolSpec],
        ) -> Result<ModelTurn, ProviderError> {
            self.0.run_exchange(history, tools).await
        }
    }

    #[tokio::test]
    async fn direct_answer_finishes_the_turn_without_tools() {
        let sink = Arc::new(InMemorySink::default());
        let (conversation, backend) = conversation_loop(
            vec![ModelTurn::Final("We offer rail journeys.".to_string())],
            sink.clone(),
            8,
        );

        let answer = conversation
            .run_turn(vec![Message::user("What do you offer?")])
            .await
            .expect("turn should succeed");

        assert_eq!(answer, "We offer rail journeys.");
        assert!(sink.records().is_empty());
        assert_eq!(backend.observed_histories.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn every_tool_request_gets_a_correlated_result_before_the_next_exchange() {
        let sink = Arc::new(InMemorySink::default());
        let (conversation, backend) = conversation_loop(
            vec![
                ModelTurn::ToolRequests {
                    content: String::new(),
                    calls: vec![
                        feedback_call("call-1", "first question"),
                        feedback_call("call-2", "second question"),
                    ],
                },
                ModelTurn::Final("All noted.".to_string()),
            ],
            sink.clone(),
            8,
        );

        let answer = conversation
            .run_turn(vec![Message::user("two questions")])
            .await
            .expect("turn should succeed");
        assert_eq!(answer, "All noted.");

        let histories = backend.observed_histories.lock().expect("lock");
        assert_eq!(histories.len(), 2);

        // The second exchange must see the assistant request followed by
        // exactly one correlated result per call, in the order received.
        let resent = &histories[1];
        let assistant = &resent[resent.len() - 3];
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.tool_calls.len(), 2);

        let results: Vec<&Message> =
            resent.iter().filter(|message| message.role == Role::Tool).collect();
        assert_eq!(results.len(), 2, "one result per requested call");
        assert_eq!(results[0].tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(results[1].tool_call_id.as_deref(), Some("call-2"));

        assert_eq!(sink.records().len(), 2);
    }

    #[tokio::test]
    async fn unknown_tool_request_degrades_without_failing_the_turn() {
        let sink = Arc::new(InMemorySink::default());
        let (conversation, backend) = conversation_loop(
            vec![
                ModelTurn::ToolRequests {
                    content: String::new(),
                    calls: vec![ToolCall {
                        id: "call-1".to_string(),
                        name: "book_flight".to_string(),
                        arguments: "{}".to_string(),
                    }],
                },
                ModelTurn::Final("Sorry, I can't book flights.".to_string()),
            ],
            sink.clone(),
            8,
        );

        let answer = conversation
            .run_turn(vec![Message::user("book me a flight")])
            .await
            .expect("turn should succeed");
        assert_eq!(answer, "Sorry, I can't book flights.");

        let histories = backend.observed_histories.lock().expect("lock");
        let resent = &histories[1];
        let result = resent
            .iter()
            .find(|message| message.role == Role::Tool)
            .expect("tool result should exist");
        assert!(result.content.contains("Unknown tool"));
        assert!(result.content.contains("book_flight"));
    }

    #[tokio::test]
    async fn round_bound_degrades_instead_of_looping_forever() {
        let sink = Arc::new(InMemorySink::default());
        let always_tools: Vec<ModelTurn> = (0..10)
            .map(|index| ModelTurn::ToolRequests {
                content: String::new(),
                calls: vec![feedback_call(&format!("call-{index}"), "again")],
            })
            .collect();
        let (conversation, backend) = conversation_loop(always_tools, sink.clone(), 3);

        let answer = conversation
            .run_turn(vec![Message::user("loop please")])
            .await
            .expect("turn should degrade, not error");

        assert!(answer.contains("wasn't able to finish"));
        // Three rounds executed, then the fourth request for tools hits
        // the bound.
        assert_eq!(sink.records().len(), 3);
        assert_eq!(backend.observed_histories.lock().expect("lock").len(), 4);
    }

    #[tokio::test]
    async fn feedback_tool_records_the_verbatim_question() {
        let sink = Arc::new(InMemorySink::default());
        let question = "What is your cancellation policy?";
        let (conversation, _backend) = conversation_loop(
            vec![
                ModelTurn::ToolRequests {
                    content: String::new(),
                    calls: vec![feedback_call("call-1", question)],
                },
                ModelTurn::Final("I've passed that on to the team.".to_string()),
            ],
            sink.clone(),
            8,
        );

        conversation
            .run_turn(vec![Message::user(question)])
            .await
            .expect("turn should succeed");

        let records = sink.records();
        assert_eq!(records.len(), 1, "feedback journal gains exactly one entry");
        match &records[0] {
            JournalRecord::Feedback(record) => assert_eq!(record.question, question),
            other => panic!("expected feedback record, got {other:?}"),
        }
    }
}
