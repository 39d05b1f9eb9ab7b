// ABOUTME: Conversational task assistant with a bounded tool-calling loop
// ABOUTME: Orchestrates transcript persistence, context rebuild, and tool execution

//! # Task Assistant
//!
//! [`TaskAssistant::send_message`] drives one chat turn: resolve or create
//! the conversation, persist the user message, rebuild the model context
//! from the transcript, then run the tool-calling loop until the model
//! produces a final reply or the iteration cap is hit.
//!
//! Identity rules: the authenticated user id is pinned into every tool
//! execution, and a conversation id belonging to another user is
//! indistinguishable from a missing one.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::database::chat::ChatManager;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::{EMPTY_RESPONSE_REPLY, ITERATION_CAP_REPLY, TASK_ASSISTANT_SYSTEM_PROMPT};
use crate::llm::{ChatMessage, ChatRequest, FunctionDeclaration, LlmProvider, MessageRole};
use crate::tools::TaskTools;

/// Maximum characters of the first message used as a conversation title
const TITLE_MAX_CHARS: usize = 60;

/// Outcome of a single assistant turn
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// Conversation the turn belongs to (created if none was given)
    pub conversation_id: String,
    /// Final assistant reply
    pub reply: String,
    /// Names of tools executed during the turn, in order
    pub executed_tools: Vec<String>,
}

/// Conversational assistant over the task store
pub struct TaskAssistant {
    chat: ChatManager,
    tools: TaskTools,
    provider: Arc<dyn LlmProvider>,
    config: ChatConfig,
}

impl TaskAssistant {
    /// Create a new assistant
    #[must_use]
    pub fn new(
        chat: ChatManager,
        tools: TaskTools,
        provider: Arc<dyn LlmProvider>,
        config: ChatConfig,
    ) -> Self {
        Self {
            chat,
            tools,
            provider,
            config,
        }
    }

    /// Run one assistant turn for the authenticated user
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty text, `ResourceNotFound` for a
    /// conversation id that does not belong to the user (checked before
    /// anything is persisted), and propagates model failures. Tool failures
    /// are not errors; they are fed back to the model as structured results.
    pub async fn send_message(
        &self,
        user_id: Uuid,
        text: &str,
        conversation_id: Option<&str>,
    ) -> AppResult<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::invalid_input("Message text must not be empty"));
        }

        // Ownership check happens before any write
        let conversation = match conversation_id {
            Some(id) => self
                .chat
                .get_conversation(id, user_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Conversation {id}")))?,
            None => {
                let title = derive_title(text);
                self.chat.create_conversation(user_id, &title).await?
            }
        };

        info!(
            conversation_id = %conversation.id,
            user_id = %user_id,
            "Starting assistant turn"
        );

        // Capture the history window before the new message lands, then
        // append it, so the model sees the full window plus the new text
        let mut messages = self.build_context(&conversation.id).await?;

        self.chat
            .add_message(&conversation.id, MessageRole::User, text)
            .await?;
        messages.push(ChatMessage::user(text));

        let declarations = TaskTools::declarations();

        self.run_tool_loop(user_id, &conversation.id, &mut messages, &declarations)
            .await
    }

    /// Rebuild the model context from the persisted transcript
    ///
    /// Tool-role records are replayed as user messages so the wire format
    /// stays valid without the original tool call ids.
    async fn build_context(&self, conversation_id: &str) -> AppResult<Vec<ChatMessage>> {
        let window = i64::try_from(self.config.context_window).unwrap_or(i64::MAX);
        let records = self
            .chat
            .get_recent_messages(conversation_id, window)
            .await?;

        let mut messages = Vec::with_capacity(records.len() + 1);
        messages.push(ChatMessage::system(TASK_ASSISTANT_SYSTEM_PROMPT));

        for record in records {
            let role: MessageRole = record.role.parse()?;
            match role {
                MessageRole::Tool => {
                    messages.push(ChatMessage::user(format!(
                        "[Tool result]: {}",
                        record.content
                    )));
                }
                MessageRole::System => {}
                _ => messages.push(ChatMessage::new(role, record.content)),
            }
        }

        Ok(messages)
    }

    /// The bounded tool-calling loop
    async fn run_tool_loop(
        &self,
        user_id: Uuid,
        conversation_id: &str,
        messages: &mut Vec<ChatMessage>,
        declarations: &[FunctionDeclaration],
    ) -> AppResult<SendOutcome> {
        let mut executed_tools = Vec::new();

        for iteration in 0..self.config.max_iterations {
            debug!(
                iteration = iteration + 1,
                max = self.config.max_iterations,
                "Assistant iteration"
            );

            let request = ChatRequest::new(messages.clone());
            let response = self
                .provider
                .complete_with_tools(&request, Some(declarations))
                .await?;

            if response.has_function_calls() {
                let calls = response.function_calls.unwrap_or_default();
                info!(count = calls.len(), "Model requested tool calls");

                messages.push(ChatMessage::assistant_with_tool_calls(
                    response.content.unwrap_or_default(),
                    calls.clone(),
                ));

                for call in calls {
                    let result = self.tools.execute(user_id, &call.name, &call.args).await;
                    let result_text = result.to_string();

                    self.chat
                        .add_message(conversation_id, MessageRole::Tool, &result_text)
                        .await?;

                    messages.push(ChatMessage::tool_result(call.id, result_text));
                    executed_tools.push(call.name);
                }

                continue;
            }

            // No tool calls: the model has its final reply
            let reply = response
                .content
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| EMPTY_RESPONSE_REPLY.to_owned());

            self.chat
                .add_message(conversation_id, MessageRole::Assistant, &reply)
                .await?;

            info!(
                conversation_id = %conversation_id,
                tools = executed_tools.len(),
                "Assistant turn finished"
            );

            return Ok(SendOutcome {
                conversation_id: conversation_id.to_owned(),
                reply,
                executed_tools,
            });
        }

        warn!(
            conversation_id = %conversation_id,
            max = self.config.max_iterations,
            "Iteration cap reached without a final reply"
        );

        let reply = ITERATION_CAP_REPLY.to_owned();
        self.chat
            .add_message(conversation_id, MessageRole::Assistant, &reply)
            .await?;

        Ok(SendOutcome {
            conversation_id: conversation_id.to_owned(),
            reply,
            executed_tools,
        })
    }
}

/// Derive a conversation title from the first user message
fn derive_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        title.push('…');
    }
    title
}
