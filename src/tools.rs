// ABOUTME: Task management tools exposed to the LLM for function calling
// ABOUTME: Maps tool invocations onto the task store with the user id pinned server-side

//! # Assistant Tools
//!
//! The five task tools the model can call: create, list, update, complete,
//! and delete. Every execution takes the authenticated user id from the
//! server, never from model-supplied arguments, and returns a structured
//! JSON result (`{"success": true, "data": ...}` or
//! `{"success": false, "error": ...}`) that is fed back to the model.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::tasks::{NewTask, TaskFilter, TaskManager, TaskUpdate};
use crate::errors::AppError;
use crate::llm::FunctionDeclaration;
use crate::models::{Priority, RecurrencePattern, Task, TaskStatus};

/// Tool executor over the task store
pub struct TaskTools {
    tasks: TaskManager,
}

impl TaskTools {
    /// Create a new tool executor
    #[must_use]
    pub const fn new(tasks: TaskManager) -> Self {
        Self { tasks }
    }

    /// Tool declarations offered to the model
    ///
    /// The schemas declare `user_id` to match the tool signatures the model
    /// sees, but execution always overrides it with the authenticated user.
    #[must_use]
    pub fn declarations() -> Vec<FunctionDeclaration> {
        vec![
            FunctionDeclaration {
                name: "create_task".to_owned(),
                description: "Create a new TODO task. Use when the user wants to add or create a task.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "user_id": {"type": "string", "description": "User ID from authentication"},
                        "title": {"type": "string", "description": "Task title (required)"},
                        "description": {"type": "string", "description": "Task description (optional)"},
                        "priority": {"type": "string", "enum": ["Low", "Medium", "High"], "description": "Task priority"},
                        "tags": {"type": "array", "items": {"type": "string"}, "description": "Task tags"},
                        "recurrence_pattern": {"type": "string", "enum": ["none", "daily", "weekly", "monthly"], "description": "Recurrence pattern"},
                        "recurrence_interval": {"type": "integer", "description": "Recurrence interval (every N periods)"},
                        "due_date": {"type": "string", "description": "Due date in ISO 8601 format"}
                    },
                    "required": ["title"]
                })),
            },
            FunctionDeclaration {
                name: "list_tasks".to_owned(),
                description: "Retrieve tasks with optional filters. Use when the user wants to see or list their tasks.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "user_id": {"type": "string", "description": "User ID from authentication"},
                        "status": {"type": "string", "enum": ["ready", "in_progress", "review", "done"], "description": "Filter by status"},
                        "priority": {"type": "string", "enum": ["Low", "Medium", "High"], "description": "Filter by priority"},
                        "tag": {"type": "string", "description": "Filter by tag"},
                        "completed": {"type": "boolean", "description": "Filter by completion"},
                        "limit": {"type": "integer", "description": "Maximum number of tasks to return"}
                    },
                    "required": []
                })),
            },
            FunctionDeclaration {
                name: "update_task".to_owned(),
                description: "Update an existing task. Only provided fields are changed.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "user_id": {"type": "string", "description": "User ID from authentication"},
                        "task_id": {"type": "string", "description": "Task ID to update"},
                        "title": {"type": "string", "description": "New task title"},
                        "description": {"type": "string", "description": "New task description"},
                        "status": {"type": "string", "enum": ["ready", "in_progress", "review", "done"], "description": "New task status"},
                        "priority": {"type": "string", "enum": ["Low", "Medium", "High"], "description": "New task priority"},
                        "tags": {"type": "array", "items": {"type": "string"}, "description": "New task tags"},
                        "due_date": {"type": "string", "description": "New due date in ISO 8601 format"}
                    },
                    "required": ["task_id"]
                })),
            },
            FunctionDeclaration {
                name: "complete_task".to_owned(),
                description: "Mark a task as completed. Use when the user wants to finish or mark a task done.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "user_id": {"type": "string", "description": "User ID from authentication"},
                        "task_id": {"type": "string", "description": "Task ID to mark as completed"}
                    },
                    "required": ["task_id"]
                })),
            },
            FunctionDeclaration {
                name: "delete_task".to_owned(),
                description: "Delete a task permanently. Use only when the user explicitly wants to remove a task.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "user_id": {"type": "string", "description": "User ID from authentication"},
                        "task_id": {"type": "string", "description": "Task ID to delete permanently"}
                    },
                    "required": ["task_id"]
                })),
            },
        ]
    }

    /// Execute a tool call for the authenticated user
    ///
    /// Never fails: tool errors come back as structured
    /// `{"success": false, "error": ...}` results so the model can recover.
    pub async fn execute(&self, user_id: Uuid, name: &str, args: &Value) -> Value {
        info!(tool = %name, user_id = %user_id, "Executing tool");
        debug!(tool = %name, args = %args, "Tool arguments");

        let result = match name {
            "create_task" => self.create_task(user_id, args).await,
            "list_tasks" => self.list_tasks(user_id, args).await,
            "update_task" => self.update_task(user_id, args).await,
            "complete_task" => self.complete_task(user_id, args).await,
            "delete_task" => self.delete_task(user_id, args).await,
            unknown => {
                warn!(tool = %unknown, "Unknown tool requested by model");
                Err(AppError::invalid_input(format!("Unknown tool: {unknown}")))
            }
        };

        match result {
            Ok(data) => json!({"success": true, "data": data}),
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool execution failed");
                json!({"success": false, "error": e.message})
            }
        }
    }

    async fn create_task(&self, user_id: Uuid, args: &Value) -> Result<Value, AppError> {
        let title = require_str(args, "title")?.to_owned();
        let new_task = NewTask {
            title,
            description: optional_str(args, "description")?.map(ToOwned::to_owned),
            priority: optional_parsed::<Priority>(args, "priority")?.unwrap_or_default(),
            status: TaskStatus::Ready,
            tags: optional_string_array(args, "tags")?,
            recurrence_pattern: optional_parsed::<RecurrencePattern>(args, "recurrence_pattern")?
                .unwrap_or_default(),
            recurrence_interval: optional_u32(args, "recurrence_interval")?,
            due_date: optional_datetime(args, "due_date")?,
        };

        let task = self.tasks.create_task(user_id, new_task).await?;
        task_json(&task)
    }

    async fn list_tasks(&self, user_id: Uuid, args: &Value) -> Result<Value, AppError> {
        let filter = TaskFilter {
            status: optional_parsed(args, "status")?,
            priority: optional_parsed(args, "priority")?,
            tag: optional_str(args, "tag")?.map(ToOwned::to_owned),
            completed: optional_bool(args, "completed")?,
            limit: optional_u32(args, "limit")?.map(i64::from),
        };

        let tasks = self.tasks.list_tasks(user_id, &filter).await?;
        serde_json::to_value(&tasks)
            .map_err(|e| AppError::internal(format!("Failed to serialize tasks: {e}")))
    }

    async fn update_task(&self, user_id: Uuid, args: &Value) -> Result<Value, AppError> {
        let task_id = require_task_id(args)?;
        let update = TaskUpdate {
            title: optional_str(args, "title")?.map(ToOwned::to_owned),
            description: optional_str(args, "description")?
                .map(|d| Some(d.to_owned())),
            completed: optional_bool(args, "completed")?,
            priority: optional_parsed(args, "priority")?,
            status: optional_parsed(args, "status")?,
            tags: match args.get("tags") {
                Some(_) => Some(optional_string_array(args, "tags")?),
                None => None,
            },
            recurrence_pattern: optional_parsed(args, "recurrence_pattern")?,
            recurrence_interval: optional_u32(args, "recurrence_interval")?,
            due_date: optional_datetime(args, "due_date")?.map(Some),
        };

        let task = self.tasks.update_task(user_id, task_id, update).await?;
        task_json(&task)
    }

    async fn complete_task(&self, user_id: Uuid, args: &Value) -> Result<Value, AppError> {
        let task_id = require_task_id(args)?;
        let outcome = self.tasks.complete_task(user_id, task_id).await?;

        let mut data = task_json(&outcome.task)?;
        if let Some(successor) = &outcome.successor {
            data["next_occurrence"] = task_json(successor)?;
        }
        Ok(data)
    }

    async fn delete_task(&self, user_id: Uuid, args: &Value) -> Result<Value, AppError> {
        let task_id = require_task_id(args)?;
        let deleted = self.tasks.delete_task(user_id, task_id).await?;
        if deleted {
            Ok(json!({"deleted": true, "task_id": task_id.to_string()}))
        } else {
            Err(AppError::not_found(format!("Task {task_id}")))
        }
    }
}

// ============================================================================
// Argument Helpers
// ============================================================================

fn task_json(task: &Task) -> Result<Value, AppError> {
    serde_json::to_value(task)
        .map_err(|e| AppError::internal(format!("Failed to serialize task: {e}")))
}

fn require_task_id(args: &Value) -> Result<Uuid, AppError> {
    let raw = require_str(args, "task_id")?;
    Uuid::parse_str(raw)
        .map_err(|_| AppError::invalid_input(format!("Invalid task_id '{raw}' (expected a UUID)")))
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, AppError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::invalid_input(format!("Missing required argument '{key}'")))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, AppError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(AppError::invalid_input(format!(
            "Argument '{key}' must be a string"
        ))),
    }
}

fn optional_bool(args: &Value, key: &str) -> Result<Option<bool>, AppError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(AppError::invalid_input(format!(
            "Argument '{key}' must be a boolean"
        ))),
    }
}

fn optional_u32(args: &Value, key: &str) -> Result<Option<u32>, AppError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                AppError::invalid_input(format!("Argument '{key}' must be a positive integer"))
            }),
    }
}

fn optional_string_array(args: &Value, key: &str) -> Result<Vec<String>, AppError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(ToOwned::to_owned).ok_or_else(|| {
                    AppError::invalid_input(format!("Argument '{key}' must be an array of strings"))
                })
            })
            .collect(),
        Some(_) => Err(AppError::invalid_input(format!(
            "Argument '{key}' must be an array of strings"
        ))),
    }
}

fn optional_parsed<T>(args: &Value, key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = AppError>,
{
    optional_str(args, key)?.map(str::parse).transpose()
}

fn optional_datetime(args: &Value, key: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    match optional_str(args, key)? {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                AppError::invalid_input(format!(
                    "Argument '{key}' must be an ISO 8601 datetime, got '{raw}'"
                ))
            }),
    }
}
