// ABOUTME: Chat route handlers for the conversational task assistant
// ABOUTME: Sends user messages through the tool loop and manages transcripts

//! Conversational assistant endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{authenticate, ServerResources};
use crate::assistant::TaskAssistant;
use crate::database::chat::{ConversationSummary, MessageRecord};
use crate::errors::AppError;
use crate::tools::TaskTools;

/// Request body for sending a message to the assistant
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// User message text
    pub text: String,
    /// Existing conversation to continue, or none to start a new one
    pub conversation_id: Option<String>,
}

/// Assistant reply with conversation context
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub conversation_id: String,
    pub reply: String,
    pub executed_tools: Vec<String>,
}

/// Chat route handlers
pub struct ChatRoutes;

impl ChatRoutes {
    /// Build the chat router
    #[must_use]
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat/message", post(Self::send_message))
            .route("/api/chat/conversations", get(Self::list_conversations))
            .route(
                "/api/chat/conversations/:conversation_id",
                axum::routing::delete(Self::delete_conversation),
            )
            .route(
                "/api/chat/conversations/:conversation_id/messages",
                get(Self::get_messages),
            )
            .with_state(resources)
    }

    /// POST /api/chat/message
    async fn send_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SendMessageRequest>,
    ) -> Result<Json<SendMessageResponse>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let assistant = TaskAssistant::new(
            resources.database.chat(),
            TaskTools::new(resources.database.tasks()),
            resources.provider.clone(),
            resources.config.chat.clone(),
        );

        let outcome = assistant
            .send_message(user_id, &request.text, request.conversation_id.as_deref())
            .await?;

        info!(
            "Assistant turn for user {} in conversation {} ran {} tool call(s)",
            user_id,
            outcome.conversation_id,
            outcome.executed_tools.len()
        );

        Ok(Json(SendMessageResponse {
            conversation_id: outcome.conversation_id,
            reply: outcome.reply,
            executed_tools: outcome.executed_tools,
        }))
    }

    /// GET /api/chat/conversations
    async fn list_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<ConversationSummary>>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let conversations = resources.database.chat().list_conversations(user_id).await?;
        Ok(Json(conversations))
    }

    /// GET /api/chat/conversations/:conversation_id/messages
    async fn get_messages(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Json<Vec<MessageRecord>>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let chat = resources.database.chat();
        chat.get_conversation(&conversation_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Conversation {conversation_id}")))?;

        let messages = chat.get_messages(&conversation_id).await?;
        Ok(Json(messages))
    }

    /// DELETE /api/chat/conversations/:conversation_id
    async fn delete_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Json<Value>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let deleted = resources
            .database
            .chat()
            .delete_conversation(&conversation_id, user_id)
            .await?;
        if !deleted {
            return Err(AppError::not_found(format!(
                "Conversation {conversation_id}"
            )));
        }
        info!(
            "Deleted conversation {} for user {}",
            conversation_id, user_id
        );

        Ok(Json(json!({ "deleted": true })))
    }
}
