// ABOUTME: Environment configuration for the taskpilot server
// ABOUTME: Parses env vars into typed config for HTTP, database, auth, and chat

//! # Server Configuration
//!
//! All runtime configuration comes from environment variables (optionally a
//! `.env` file in development). `JWT_SECRET` is the only required variable;
//! everything else has a sensible default.

use anyhow::{Context, Result};
use std::env;
use tracing::warn;

/// Default HTTP listen port
pub const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default SQLite database URL
pub const DEFAULT_DATABASE_URL: &str = "sqlite:taskpilot.db";

/// Default JWT token lifetime in hours
pub const DEFAULT_JWT_EXPIRY_HOURS: u64 = 24;

/// Default OpenAI-compatible API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default number of transcript messages replayed as model context
pub const DEFAULT_CONTEXT_WINDOW: usize = 20;

/// Default cap on tool-calling iterations per chat turn
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Complete server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection URL (`sqlite:` scheme)
    pub database_url: String,
    /// Authentication settings
    pub auth: AuthConfig,
    /// LLM provider settings
    pub llm: LlmConfig,
    /// Chat assistant settings
    pub chat: ChatConfig,
}

/// JWT authentication settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret, required
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_expiry_hours: u64,
}

/// OpenAI-compatible provider settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key; unset means chat requests fail with a config error
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model identifier sent with each completion request
    pub model: String,
}

/// Chat assistant tuning
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// How many recent transcript messages are replayed to the model
    pub context_window: usize,
    /// Maximum tool-calling round trips per user message
    pub max_iterations: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is unset or a numeric variable
    /// fails to parse.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let config = Self {
            http_port: env_var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string())?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            database_url: env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL)?,
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .context("JWT_SECRET environment variable is required")?,
                jwt_expiry_hours: env_var_or(
                    "JWT_EXPIRY_HOURS",
                    &DEFAULT_JWT_EXPIRY_HOURS.to_string(),
                )?
                .parse()
                .context("Invalid JWT_EXPIRY_HOURS value")?,
            },
            llm: LlmConfig {
                api_key: env::var("OPENAI_API_KEY").ok(),
                base_url: env_var_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)?,
                model: env_var_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL)?,
            },
            chat: ChatConfig {
                context_window: env_var_or(
                    "CHAT_CONTEXT_WINDOW",
                    &DEFAULT_CONTEXT_WINDOW.to_string(),
                )?
                .parse()
                .context("Invalid CHAT_CONTEXT_WINDOW value")?,
                max_iterations: env_var_or(
                    "CHAT_MAX_ITERATIONS",
                    &DEFAULT_MAX_ITERATIONS.to_string(),
                )?
                .parse()
                .context("Invalid CHAT_MAX_ITERATIONS value")?,
            },
        };

        Ok(config)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_or_returns_default() {
        let value = env_var_or("TASKPILOT_DOES_NOT_EXIST", "fallback").unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_chat_config_defaults() {
        let chat = ChatConfig::default();
        assert_eq!(chat.context_window, 20);
        assert_eq!(chat.max_iterations, 5);
    }
}
