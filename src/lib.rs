// ABOUTME: Main library entry point for the TaskPilot task assistant
// ABOUTME: Provides a REST API and a conversational LLM-backed task manager

#![deny(unsafe_code)]

//! # TaskPilot
//!
//! A task management service with a conversational assistant. Users manage
//! their TODO lists either through a plain REST API or by talking to an
//! LLM-backed assistant that plans and executes task operations on their
//! behalf.
//!
//! ## Features
//!
//! - **Task CRUD**: Priorities, statuses, tags, due dates, and recurrence
//! - **Conversational assistant**: A bounded tool-calling loop that lets a
//!   language model create, list, update, complete, and delete tasks
//! - **Persistent transcripts**: Conversations and messages stored in
//!   SQLite, replayed as context for each assistant turn
//! - **JWT authentication**: Every operation is scoped to the
//!   authenticated user
//!
//! ## Quick Start
//!
//! 1. Set `JWT_SECRET` and (optionally) `OPENAI_API_KEY`
//! 2. Start the server with `taskpilot-server`
//! 3. Register a user via `POST /auth/register` and start chatting via
//!    `POST /api/chat/message`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use taskpilot::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("TaskPilot configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod routes;
pub mod tools;
