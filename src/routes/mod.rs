// ABOUTME: HTTP route assembly and shared server resources
// ABOUTME: Wires auth, task, and chat routers over a single axum state

//! # HTTP Routes
//!
//! All route handlers live here, grouped by surface: [`auth`] for
//! registration and login, [`tasks`] for the task CRUD API, and [`chat`]
//! for the assistant. Handlers share an [`Arc<ServerResources>`] state.

pub mod auth;
pub mod chat;
pub mod tasks;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppError;
use crate::llm::LlmProvider;

/// Shared resources for all route handlers
pub struct ServerResources {
    /// Database connection
    pub database: Database,
    /// JWT authentication manager
    pub auth_manager: AuthManager,
    /// LLM provider for the assistant
    pub provider: Arc<dyn LlmProvider>,
    /// Server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Create new server resources
    #[must_use]
    pub fn new(
        database: Database,
        auth_manager: AuthManager,
        provider: Arc<dyn LlmProvider>,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            auth_manager,
            provider,
            config,
        }
    }
}

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::AuthRoutes::router(resources.clone()))
        .merge(tasks::TaskRoutes::router(resources.clone()))
        .merge(chat::ChatRoutes::router(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Liveness endpoint
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Extract and authenticate the user from the Authorization header or cookie
pub(crate) fn authenticate(
    headers: &axum::http::HeaderMap,
    resources: &ServerResources,
) -> Result<uuid::Uuid, AppError> {
    let token = if let Some(auth_header) = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
    {
        crate::auth::strip_bearer(auth_header)
            .ok_or_else(|| AppError::auth_invalid("Malformed authorization header"))?
            .to_owned()
    } else if let Some(token) = cookie_value(headers, "auth_token") {
        token
    } else {
        return Err(AppError::auth_required());
    };

    resources.auth_manager.extract_user_id(&token)
}

/// Pull a named cookie out of the Cookie header
fn cookie_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}
