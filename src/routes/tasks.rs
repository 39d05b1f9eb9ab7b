// ABOUTME: REST route handlers for task CRUD and completion
// ABOUTME: Every operation is scoped to the authenticated user

//! Task management endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::{authenticate, ServerResources};
use crate::database::tasks::{NewTask, TaskFilter, TaskUpdate};
use crate::errors::AppError;
use crate::models::Task;

/// Response for task completion, carrying the recurrence successor when
/// one was created
#[derive(Debug, Serialize)]
pub struct CompleteTaskResponse {
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_occurrence: Option<Task>,
}

/// Task route handlers
pub struct TaskRoutes;

impl TaskRoutes {
    /// Build the task router
    #[must_use]
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/tasks", get(Self::list_tasks).post(Self::create_task))
            .route(
                "/api/tasks/:task_id",
                get(Self::get_task)
                    .patch(Self::update_task)
                    .delete(Self::delete_task),
            )
            .route("/api/tasks/:task_id/complete", post(Self::complete_task))
            .with_state(resources)
    }

    /// POST /api/tasks
    async fn create_task(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(new_task): Json<NewTask>,
    ) -> Result<(StatusCode, Json<Task>), AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let task = resources.database.tasks().create_task(user_id, new_task).await?;
        info!("Created task {} for user {}", task.id, user_id);

        Ok((StatusCode::CREATED, Json(task)))
    }

    /// GET /api/tasks
    async fn list_tasks(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(filter): Query<TaskFilter>,
    ) -> Result<Json<Vec<Task>>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let tasks = resources.database.tasks().list_tasks(user_id, &filter).await?;
        Ok(Json(tasks))
    }

    /// GET /api/tasks/:task_id
    async fn get_task(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(task_id): Path<Uuid>,
    ) -> Result<Json<Task>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let task = resources
            .database
            .tasks()
            .get_task(user_id, task_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Task {task_id}")))?;

        Ok(Json(task))
    }

    /// PATCH /api/tasks/:task_id
    async fn update_task(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(task_id): Path<Uuid>,
        Json(update): Json<TaskUpdate>,
    ) -> Result<Json<Task>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let task = resources
            .database
            .tasks()
            .update_task(user_id, task_id, update)
            .await?;
        info!("Updated task {} for user {}", task_id, user_id);

        Ok(Json(task))
    }

    /// POST /api/tasks/:task_id/complete
    async fn complete_task(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(task_id): Path<Uuid>,
    ) -> Result<Json<CompleteTaskResponse>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let outcome = resources
            .database
            .tasks()
            .complete_task(user_id, task_id)
            .await?;

        if let Some(successor) = &outcome.successor {
            info!(
                "Completed recurring task {} for user {}, created successor {}",
                task_id, user_id, successor.id
            );
        } else {
            info!("Completed task {} for user {}", task_id, user_id);
        }

        Ok(Json(CompleteTaskResponse {
            task: outcome.task,
            next_occurrence: outcome.successor,
        }))
    }

    /// DELETE /api/tasks/:task_id
    async fn delete_task(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(task_id): Path<Uuid>,
    ) -> Result<Json<Value>, AppError> {
        let user_id = authenticate(&headers, &resources)?;

        let deleted = resources.database.tasks().delete_task(user_id, task_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Task {task_id}")));
        }
        info!("Deleted task {} for user {}", task_id, user_id);

        Ok(Json(json!({ "deleted": true })))
    }
}
