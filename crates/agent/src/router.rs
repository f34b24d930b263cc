//! The router: a conversational front end that lets the model decide
//! whether to consult a domain expert.
//!
//! ```text
//! query ─▶ history + tool definitions ─▶ model
//!                                         │
//!            ┌── NoCall ◀─────────────────┤
//!            │                            └── Call ─▶ run tools ─▶ append results ─┐
//!            ▼                                                                     │
//!         response ◀── final pass (no tools once rounds are spent) ◀───────────────┘
//! ```
//!
//! There is no routing heuristic here; tool choice belongs to the model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use synaxarion_core::message::{Conversation, ConversationId, Message, Role};
use synaxarion_core::provider::{Provider, ProviderRequest, ToolDecision};
use synaxarion_core::tool::{ToolCall, ToolRegistry};
use synaxarion_core::Result;
use tracing::{debug, info, warn};

/// Returned when the model produces an empty final answer.
pub const EMPTY_ANSWER_FALLBACK: &str =
    "I'm sorry, I could not find an answer to that. Please try rephrasing your question.";

/// One conversation: its id and append-only history.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub conversation: Conversation,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::with_id(ConversationId(id.into())),
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.conversation.id
    }

    pub fn history(&self) -> &[Message] {
        &self.conversation.messages
    }
}

/// One capability invocation made while answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStep {
    pub tool: String,
    pub arguments: serde_json::Value,
    pub output: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterReply {
    pub response: String,
    pub trace: Vec<ToolStep>,
}

pub struct Router {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_tool_rounds: u32,
}

impl Router {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            system_prompt: system_prompt.into(),
            max_tool_rounds: 1,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Tool-calling rounds allowed before the model must answer in text.
    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn ensure_system_prompt(&self, conversation: &mut Conversation) {
        match conversation.messages.first() {
            Some(first) if first.role == Role::System => {}
            _ => conversation
                .messages
                .insert(0, Message::system(&self.system_prompt)),
        }
    }

    /// Answer `query` within `session`, appending every exchanged message to
    /// its history.
    ///
    /// The history is only updated once the turn completes. A failed or
    /// cancelled turn leaves it as it was.
    pub async fn process(&self, session: &mut Session, query: &str) -> Result<RouterReply> {
        let mut conversation = session.conversation.clone();
        let reply = self.run_turn(&mut conversation, query).await?;
        session.conversation = conversation;
        Ok(reply)
    }

    async fn run_turn(&self, conversation: &mut Conversation, query: &str) -> Result<RouterReply> {
        self.ensure_system_prompt(conversation);
        conversation.push(Message::user(query));

        info!(
            session = %conversation.id,
            messages = conversation.len(),
            "Routing query"
        );

        let definitions = self.tools.definitions();
        let mut trace = Vec::new();
        let mut rounds = 0;

        loop {
            let offer_tools = rounds < self.max_tool_rounds && !definitions.is_empty();

            let mut request = ProviderRequest::new(&self.model, conversation.messages.clone());
            request.temperature = self.temperature;
            request.max_tokens = self.max_tokens;
            if offer_tools {
                request.tools = definitions.clone();
            }

            debug!(session = %conversation.id, round = rounds, offer_tools, "Calling model");
            let response = self.provider.complete(request).await?;

            let calls = match response.decision() {
                ToolDecision::Call(calls) if offer_tools => calls,
                decision => {
                    if matches!(decision, ToolDecision::Call(_)) {
                        warn!(session = %conversation.id, "Ignoring tool calls on the final pass");
                    }
                    let text = response.message.content;
                    let answer = if text.trim().is_empty() {
                        EMPTY_ANSWER_FALLBACK.to_string()
                    } else {
                        text
                    };
                    conversation.push(Message::assistant(&answer));
                    return Ok(RouterReply {
                        response: answer,
                        trace,
                    });
                }
            };

            conversation.push(response.message);

            for tc in &calls {
                let arguments: serde_json::Value = serde_json::from_str(&tc.arguments)
                    .unwrap_or_else(|_| serde_json::Value::String(tc.arguments.clone()));
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: arguments.clone(),
                };

                let (output, success) = match self.tools.execute(&call).await {
                    Ok(result) => (result.output, result.success),
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, "Tool execution failed");
                        (format!("Error: {e}"), false)
                    }
                };

                debug!(tool = %tc.name, success, "Tool finished");
                conversation.push(Message::tool_result(&tc.id, &output));
                trace.push(ToolStep {
                    tool: tc.name.clone(),
                    arguments,
                    output,
                    success,
                });
            }

            rounds += 1;
        }
    }
}
