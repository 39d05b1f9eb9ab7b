// ABOUTME: Database operations for TODO tasks with per-user isolation
// ABOUTME: Handles CRUD, filtering, status/completed coupling, and recurrence

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::users::parse_timestamp;
use crate::errors::{AppError, AppResult};
use crate::models::{
    validate_description, validate_title, Priority, RecurrencePattern, Task, TaskStatus,
};

// ============================================================================
// Input Types
// ============================================================================

/// Fields for creating a task
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    /// Task title, required
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Priority, defaults to Medium
    #[serde(default)]
    pub priority: Priority,
    /// Kanban status, defaults to ready
    #[serde(default)]
    pub status: TaskStatus,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Recurrence pattern, defaults to none
    #[serde(default)]
    pub recurrence_pattern: RecurrencePattern,
    /// Recurrence interval, defaults to 1
    #[serde(default)]
    pub recurrence_interval: Option<u32>,
    /// Optional due date
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update for a task; `None` fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub tags: Option<Vec<String>>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_interval: Option<u32>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskUpdate {
    /// Whether the update carries no changes at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.tags.is_none()
            && self.recurrence_pattern.is_none()
            && self.recurrence_interval.is_none()
            && self.due_date.is_none()
    }
}

/// Filter for listing tasks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    /// Only tasks in this status
    pub status: Option<TaskStatus>,
    /// Only tasks at this priority
    pub priority: Option<Priority>,
    /// Only tasks carrying this tag
    pub tag: Option<String>,
    /// Only tasks matching this completion flag
    pub completed: Option<bool>,
    /// Maximum number of tasks returned
    pub limit: Option<i64>,
}

/// Result of completing a task
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// The task after completion
    pub task: Task,
    /// Successor spawned by recurrence, if any
    pub successor: Option<Task>,
}

// ============================================================================
// Task Manager
// ============================================================================

/// Task database operations manager
///
/// Every operation takes the owning `user_id` and filters on it; a task id
/// belonging to another user behaves exactly like a missing task.
pub struct TaskManager {
    pool: SqlitePool,
}

impl TaskManager {
    /// Create a new task manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a task for a user
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for constraint violations (empty or oversized
    /// title, oversized description) or a database error.
    pub async fn create_task(&self, user_id: Uuid, new_task: NewTask) -> AppResult<Task> {
        validate_title(&new_task.title)?;
        if let Some(description) = &new_task.description {
            validate_description(description)?;
        }

        let now = Utc::now();
        let status = new_task.status;
        let task = Task {
            id: Uuid::new_v4(),
            user_id,
            title: new_task.title.trim().to_owned(),
            description: new_task.description,
            completed: status == TaskStatus::Done,
            priority: new_task.priority,
            status,
            tags: normalize_tags(new_task.tags),
            recurrence_pattern: new_task.recurrence_pattern,
            recurrence_interval: new_task.recurrence_interval.unwrap_or(1).max(1),
            due_date: new_task.due_date,
            created_at: now,
            updated_at: now,
        };

        insert_task(&self.pool, &task).await?;
        Ok(task)
    }

    /// Get a task by id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_task(&self, user_id: Uuid, task_id: Uuid) -> AppResult<Option<Task>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, title, description, completed, priority, status, tags,
                   recurrence_pattern, recurrence_interval, due_date, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(task_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get task: {e}")))?;

        row.map(row_to_task).transpose()
    }

    /// List tasks for a user, newest first, with optional filters
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, title, description, completed, priority, status, tags,
                   recurrence_pattern, recurrence_interval, due_date, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list tasks: {e}")))?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(row_to_task(row)?);
        }

        // Tag filtering needs the parsed tag list, so filter after mapping
        let mut tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| filter.completed.is_none_or(|c| t.completed == c))
            .filter(|t| {
                filter
                    .tag
                    .as_ref()
                    .is_none_or(|tag| t.tags.iter().any(|candidate| candidate == tag))
            })
            .collect();

        if let Some(limit) = filter.limit {
            if limit >= 0 {
                tasks.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            }
        }

        Ok(tasks)
    }

    /// Apply a partial update to a task
    ///
    /// Keeps `completed` and `status == done` coupled: an update that sets
    /// one side adjusts the other. When both are supplied, `status` wins.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the task does not exist for this user,
    /// `InvalidInput` for constraint violations, or a database error.
    pub async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> AppResult<Task> {
        let mut task = self
            .get_task(user_id, task_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Task {task_id}")))?;

        if let Some(title) = update.title {
            validate_title(&title)?;
            task.title = title.trim().to_owned();
        }
        if let Some(description) = update.description {
            if let Some(text) = &description {
                validate_description(text)?;
            }
            task.description = description;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(tags) = update.tags {
            task.tags = normalize_tags(tags);
        }
        if let Some(pattern) = update.recurrence_pattern {
            task.recurrence_pattern = pattern;
        }
        if let Some(interval) = update.recurrence_interval {
            task.recurrence_interval = interval.max(1);
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }

        // Status/completed coupling: status takes precedence when both change
        if let Some(status) = update.status {
            task.status = status;
            task.completed = status == TaskStatus::Done;
        } else if let Some(completed) = update.completed {
            task.completed = completed;
            if completed {
                task.status = TaskStatus::Done;
            } else if task.status == TaskStatus::Done {
                task.status = TaskStatus::Ready;
            }
        }

        task.updated_at = Utc::now();
        persist_task(&self.pool, &task).await?;
        Ok(task)
    }

    /// Mark a task completed, spawning a recurrence successor if configured
    ///
    /// Completing an already-completed task is a no-op and never spawns a
    /// second successor.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the task does not exist for this user,
    /// or a database error.
    pub async fn complete_task(&self, user_id: Uuid, task_id: Uuid) -> AppResult<CompletionOutcome> {
        let mut task = self
            .get_task(user_id, task_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Task {task_id}")))?;

        if task.completed {
            return Ok(CompletionOutcome {
                task,
                successor: None,
            });
        }

        let now = Utc::now();
        task.completed = true;
        task.status = TaskStatus::Done;
        task.updated_at = now;

        let successor = task
            .recurrence_pattern
            .is_recurring()
            .then(|| task.next_occurrence(now));

        // Completion and the successor insert commit together
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            UPDATE tasks
            SET completed = $1, status = $2, updated_at = $3
            WHERE id = $4 AND user_id = $5
            ",
        )
        .bind(task.completed)
        .bind(task.status.as_str())
        .bind(task.updated_at.to_rfc3339())
        .bind(task.id.to_string())
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete task: {e}")))?;

        if let Some(next) = &successor {
            bind_task_insert(sqlx::query(INSERT_TASK_SQL), next)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to create recurring task: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit completion: {e}")))?;

        Ok(CompletionOutcome { task, successor })
    }

    /// Delete a task
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete task: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

const INSERT_TASK_SQL: &str = r"
    INSERT INTO tasks (id, user_id, title, description, completed, priority, status, tags,
                       recurrence_pattern, recurrence_interval, due_date, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
";

fn bind_task_insert<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    task: &'q Task,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(task.id.to_string())
        .bind(task.user_id.to_string())
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.completed)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.tags.join(","))
        .bind(task.recurrence_pattern.as_str())
        .bind(i64::from(task.recurrence_interval))
        .bind(task.due_date.map(|d| d.to_rfc3339()))
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
}

async fn insert_task(pool: &SqlitePool, task: &Task) -> AppResult<()> {
    bind_task_insert(sqlx::query(INSERT_TASK_SQL), task)
        .execute(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create task: {e}")))?;
    Ok(())
}

async fn persist_task(pool: &SqlitePool, task: &Task) -> AppResult<()> {
    sqlx::query(
        r"
        UPDATE tasks
        SET title = $1, description = $2, completed = $3, priority = $4, status = $5,
            tags = $6, recurrence_pattern = $7, recurrence_interval = $8, due_date = $9,
            updated_at = $10
        WHERE id = $11 AND user_id = $12
        ",
    )
    .bind(&task.title)
    .bind(task.description.as_deref())
    .bind(task.completed)
    .bind(task.priority.as_str())
    .bind(task.status.as_str())
    .bind(task.tags.join(","))
    .bind(task.recurrence_pattern.as_str())
    .bind(i64::from(task.recurrence_interval))
    .bind(task.due_date.map(|d| d.to_rfc3339()))
    .bind(task.updated_at.to_rfc3339())
    .bind(task.id.to_string())
    .bind(task.user_id.to_string())
    .execute(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to update task: {e}")))?;

    Ok(())
}

fn row_to_task(r: sqlx::sqlite::SqliteRow) -> AppResult<Task> {
    let id: String = r.get("id");
    let user_id: String = r.get("user_id");
    let priority: String = r.get("priority");
    let status: String = r.get("status");
    let tags: String = r.get("tags");
    let recurrence_pattern: String = r.get("recurrence_pattern");
    let recurrence_interval: i64 = r.get("recurrence_interval");
    let due_date: Option<String> = r.get("due_date");
    let created_at: String = r.get("created_at");
    let updated_at: String = r.get("updated_at");

    Ok(Task {
        id: Uuid::parse_str(&id)
            .map_err(|e| AppError::database(format!("Invalid task id in database: {e}")))?,
        user_id: Uuid::parse_str(&user_id)
            .map_err(|e| AppError::database(format!("Invalid user id in database: {e}")))?,
        title: r.get("title"),
        description: r.get("description"),
        completed: r.get("completed"),
        priority: priority.parse()?,
        status: status.parse()?,
        tags: split_tags(&tags),
        recurrence_pattern: recurrence_pattern.parse()?,
        recurrence_interval: u32::try_from(recurrence_interval).unwrap_or(1),
        due_date: due_date.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect()
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
