// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, auth, scripted LLM provider, and user helpers

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Shared test utilities for `taskpilot`
//!
//! Common setup functions to reduce duplication across integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use anyhow::Result;
use async_trait::async_trait;
use taskpilot::{
    auth::AuthManager,
    config::{AuthConfig, ChatConfig, LlmConfig, ServerConfig},
    database::Database,
    errors::AppError,
    llm::{
        ChatRequest, ChatResponseWithTools, FunctionCall, FunctionDeclaration, LlmProvider,
    },
    models::User,
    routes::ServerResources,
};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// LLM provider that replays a scripted sequence of responses
///
/// Each call to `complete_with_tools` pops the next scripted step. Requests
/// are recorded so tests can assert on the context the assistant built.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ScriptedStep>>,
    requests: Mutex<Vec<ChatRequest>>,
}

pub enum ScriptedStep {
    Respond(ChatResponseWithTools),
    Fail(AppError),
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Provider that answers every call with the same plain text reply
    pub fn text(reply: &str) -> Self {
        Self::new(vec![ScriptedStep::Respond(text_response(reply))])
    }

    /// Requests the assistant sent, in order
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        _tools: Option<&[FunctionDeclaration]>,
    ) -> Result<ChatResponseWithTools, AppError> {
        self.requests.lock().unwrap().push(request.clone());

        match self.script.lock().unwrap().pop_front() {
            Some(ScriptedStep::Respond(response)) => Ok(response),
            Some(ScriptedStep::Fail(error)) => Err(error),
            // Scripts that run out keep answering with plain text so
            // iteration-cap tests can script only the tool-call steps
            None => Ok(text_response("ok")),
        }
    }
}

/// Build a plain text model response
pub fn text_response(content: &str) -> ChatResponseWithTools {
    ChatResponseWithTools {
        content: Some(content.to_owned()),
        function_calls: None,
        model: "scripted-model".to_owned(),
        usage: None,
        finish_reason: Some("stop".to_owned()),
    }
}

/// Build a model response requesting a single tool call
pub fn tool_call_response(call_id: &str, name: &str, args: serde_json::Value) -> ChatResponseWithTools {
    ChatResponseWithTools {
        content: None,
        function_calls: Some(vec![FunctionCall {
            id: call_id.to_owned(),
            name: name.to_owned(),
            args,
        }]),
        model: "scripted-model".to_owned(),
        usage: None,
        finish_reason: Some("tool_calls".to_owned()),
    }
}

/// Standard test database setup (in-memory SQLite)
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    let database = Database::new("sqlite::memory:").await?;
    Ok(database)
}

/// Create test authentication manager
pub fn create_test_auth_manager() -> AuthManager {
    AuthManager::new(b"test-jwt-secret-for-integration-tests", 24)
}

/// Test server configuration (no real LLM endpoint)
pub fn create_test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        auth: AuthConfig {
            jwt_secret: "test-jwt-secret-for-integration-tests".to_owned(),
            jwt_expiry_hours: 24,
        },
        llm: LlmConfig {
            api_key: None,
            base_url: "http://localhost:0/v1".to_owned(),
            model: "scripted-model".to_owned(),
        },
        chat: ChatConfig::default(),
    }
}

/// Server resources backed by an in-memory database and a scripted provider
pub async fn create_test_server_resources(
    provider: Arc<dyn LlmProvider>,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    let auth_manager = create_test_auth_manager();
    let config = create_test_config();
    Ok(Arc::new(ServerResources::new(
        database,
        auth_manager,
        provider,
        config,
    )))
}

/// Create a standard test user
pub async fn create_test_user(database: &Database) -> Result<(Uuid, User)> {
    create_test_user_with_email(database, "test@example.com").await
}

/// Create a test user with custom email
pub async fn create_test_user_with_email(database: &Database, email: &str) -> Result<(Uuid, User)> {
    let user = database
        .users()
        .create_user(email, Some("Test User"), "test_hash")
        .await?;
    Ok((user.id, user))
}
