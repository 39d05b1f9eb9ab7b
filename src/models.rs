// ABOUTME: Core domain models for users, tasks, and task lifecycle enums
// ABOUTME: Defines serde-friendly types shared between the store, tools, and routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Domain Models
//!
//! Users and tasks, plus the enums that gate task lifecycle: priority,
//! Kanban status, and recurrence. Conversations and messages live with the
//! chat store in [`crate::database::chat`].

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

// ============================================================================
// User
// ============================================================================

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Email address (unique)
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Bcrypt password hash, never serialized out
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Task Enums
// ============================================================================

/// Task priority level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// String form used in the database and tool schema
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            other => Err(AppError::invalid_input(format!(
                "Invalid priority '{other}' (expected High, Medium, or Low)"
            ))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kanban column status for a task
///
/// `Done` is coupled to the `completed` flag: a task is `Done` if and only
/// if it is completed. The store enforces the coupling on every update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Ready,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    /// String form used in the database and tool schema
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(Self::Ready),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            other => Err(AppError::invalid_input(format!(
                "Invalid status '{other}' (expected ready, in_progress, review, or done)"
            ))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence pattern for repeating tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl RecurrencePattern {
    /// String form used in the database and tool schema
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Whether completing a task with this pattern spawns a successor
    #[must_use]
    pub const fn is_recurring(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Advance a due date by `interval` units of this pattern
    ///
    /// Monthly recurrence uses calendar months, clamping the day when the
    /// target month is shorter (Jan 31 + 1 month = Feb 28/29).
    #[must_use]
    pub fn advance(self, due: DateTime<Utc>, interval: u32) -> DateTime<Utc> {
        match self {
            Self::None => due,
            Self::Daily => due + Duration::days(i64::from(interval)),
            Self::Weekly => due + Duration::weeks(i64::from(interval)),
            Self::Monthly => due
                .checked_add_months(Months::new(interval))
                .unwrap_or(due),
        }
    }
}

impl FromStr for RecurrencePattern {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(AppError::invalid_input(format!(
                "Invalid recurrence pattern '{other}' (expected none, daily, weekly, or monthly)"
            ))),
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Task
// ============================================================================

/// Maximum task title length
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum task description length
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// A TODO task owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,
    /// Owning user ID; every store operation filters on it
    pub user_id: Uuid,
    /// Task title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Completion flag, coupled to `status == Done`
    pub completed: bool,
    /// Priority level
    pub priority: Priority,
    /// Kanban column
    pub status: TaskStatus,
    /// Short tags for filtering
    pub tags: Vec<String>,
    /// Recurrence pattern; `None` means one-shot
    pub recurrence_pattern: RecurrencePattern,
    /// Recurrence interval (every N days/weeks/months)
    pub recurrence_interval: u32,
    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task was last modified
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build the successor task spawned when a recurring task completes
    ///
    /// Same fields, fresh id and timestamps, reset to not-completed/ready,
    /// due date advanced by one recurrence step. A task without a due date
    /// anchors its schedule at the completion time.
    #[must_use]
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            title: self.title.clone(),
            description: self.description.clone(),
            completed: false,
            priority: self.priority,
            status: TaskStatus::Ready,
            tags: self.tags.clone(),
            recurrence_pattern: self.recurrence_pattern,
            recurrence_interval: self.recurrence_interval,
            due_date: Some(
                self.recurrence_pattern
                    .advance(self.due_date.unwrap_or(now), self.recurrence_interval.max(1)),
            ),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validate a task title against length constraints
///
/// # Errors
///
/// Returns `InvalidInput` if the title is empty or longer than
/// [`MAX_TITLE_LEN`].
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("Task title must not be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::invalid_input(format!(
            "Task title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a task description against length constraints
///
/// # Errors
///
/// Returns `InvalidInput` if the description is longer than
/// [`MAX_DESCRIPTION_LEN`].
pub fn validate_description(description: &str) -> Result<(), AppError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::invalid_input(format!(
            "Task description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}
