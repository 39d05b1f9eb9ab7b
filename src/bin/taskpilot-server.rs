// ABOUTME: Server binary for the TaskPilot task assistant
// ABOUTME: Wires config, database, auth, and the LLM provider into an axum app

//! # TaskPilot Server Binary
//!
//! Starts the TaskPilot REST API with JWT authentication, SQLite storage,
//! and the conversational task assistant.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use taskpilot::{
    auth::AuthManager,
    config::ServerConfig,
    database::Database,
    llm::{OpenAiConfig, OpenAiProvider},
    logging, routes,
    routes::ServerResources,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "taskpilot-server")]
#[command(about = "TaskPilot - Conversational task management server")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    logging::init_from_env()?;

    info!("Starting TaskPilot server");
    info!("Database URL: {}", config.database_url);

    let database = Database::new(&config.database_url).await?;
    info!("Database initialized successfully");

    // JWT expiry is a small positive configuration value
    #[allow(clippy::cast_possible_wrap)]
    let auth_manager = AuthManager::new(
        config.auth.jwt_secret.as_bytes(),
        config.auth.jwt_expiry_hours as i64,
    );
    info!("Authentication manager initialized");

    if config.llm.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; assistant requests will fail until it is configured");
    }
    let provider = Arc::new(OpenAiProvider::new(OpenAiConfig::from(&config.llm))?);

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(
        database,
        auth_manager,
        provider,
        config,
    ));

    let app = routes::router(resources);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("TaskPilot server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
