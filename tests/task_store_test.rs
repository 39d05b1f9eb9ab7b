// ABOUTME: Integration tests for the task database manager
// ABOUTME: Covers CRUD, status coupling, recurrence, filtering, and isolation

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{create_test_database, create_test_user, create_test_user_with_email};
use taskpilot::database::tasks::{NewTask, TaskFilter, TaskUpdate};
use taskpilot::errors::ErrorCode;
use taskpilot::models::{Priority, RecurrencePattern, TaskStatus};
use uuid::Uuid;

// ============================================================================
// Create + Get
// ============================================================================

#[tokio::test]
async fn test_create_task_applies_defaults() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "  Buy milk  ".to_owned(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.status, TaskStatus::Ready);
    assert!(!task.completed);
    assert_eq!(task.recurrence_pattern, RecurrencePattern::None);
    assert_eq!(task.recurrence_interval, 1);

    let fetched = database.tasks().get_task(user_id, task.id).await.unwrap();
    assert_eq!(fetched.unwrap().title, "Buy milk");
}

#[tokio::test]
async fn test_create_task_rejects_empty_title() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let err = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "   ".to_owned(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_create_task_rejects_oversized_title() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let err = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "x".repeat(201),
                ..NewTask::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_create_task_done_status_sets_completed() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Already finished".to_owned(),
                status: TaskStatus::Done,
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    assert!(task.completed);
}

// ============================================================================
// Update + Coupling
// ============================================================================

#[tokio::test]
async fn test_update_status_done_marks_completed() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Ship release".to_owned(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let updated = database
        .tasks()
        .update_task(
            user_id,
            task.id,
            TaskUpdate {
                status: Some(TaskStatus::Done),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.completed);
    assert_eq!(updated.status, TaskStatus::Done);
}

#[tokio::test]
async fn test_update_completed_true_sets_done_status() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Write report".to_owned(),
                status: TaskStatus::InProgress,
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let updated = database
        .tasks()
        .update_task(
            user_id,
            task.id,
            TaskUpdate {
                completed: Some(true),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.completed);
    assert_eq!(updated.status, TaskStatus::Done);
}

#[tokio::test]
async fn test_update_uncomplete_resets_done_to_ready() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Reopen me".to_owned(),
                status: TaskStatus::Done,
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let updated = database
        .tasks()
        .update_task(
            user_id,
            task.id,
            TaskUpdate {
                completed: Some(false),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();

    assert!(!updated.completed);
    assert_eq!(updated.status, TaskStatus::Ready);
}

#[tokio::test]
async fn test_update_status_wins_over_completed() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Conflicting update".to_owned(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    // completed=true and status=review disagree; status decides
    let updated = database
        .tasks()
        .update_task(
            user_id,
            task.id,
            TaskUpdate {
                completed: Some(true),
                status: Some(TaskStatus::Review),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, TaskStatus::Review);
    assert!(!updated.completed);
}

#[tokio::test]
async fn test_update_missing_task_returns_not_found() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let err = database
        .tasks()
        .update_task(
            user_id,
            Uuid::new_v4(),
            TaskUpdate {
                title: Some("Nope".to_owned()),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

// ============================================================================
// Completion + Recurrence
// ============================================================================

#[tokio::test]
async fn test_complete_non_recurring_task() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "One-off".to_owned(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let outcome = database.tasks().complete_task(user_id, task.id).await.unwrap();
    assert!(outcome.task.completed);
    assert_eq!(outcome.task.status, TaskStatus::Done);
    assert!(outcome.successor.is_none());

    let all = database
        .tasks()
        .list_tasks(user_id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_complete_recurring_task_spawns_successor() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let due = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Water plants".to_owned(),
                recurrence_pattern: RecurrencePattern::Weekly,
                recurrence_interval: Some(2),
                due_date: Some(due),
                tags: vec!["home".to_owned()],
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let outcome = database.tasks().complete_task(user_id, task.id).await.unwrap();
    let successor = outcome.successor.expect("recurring completion spawns a successor");

    assert_ne!(successor.id, task.id);
    assert_eq!(successor.title, task.title);
    assert_eq!(successor.tags, task.tags);
    assert!(!successor.completed);
    assert_eq!(successor.status, TaskStatus::Ready);
    assert_eq!(successor.recurrence_pattern, RecurrencePattern::Weekly);
    assert_eq!(successor.due_date, Some(due + Duration::weeks(2)));

    // Successor is persisted alongside the completed original
    let all = database
        .tasks()
        .list_tasks(user_id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_complete_is_idempotent() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Daily standup".to_owned(),
                recurrence_pattern: RecurrencePattern::Daily,
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let first = database.tasks().complete_task(user_id, task.id).await.unwrap();
    assert!(first.successor.is_some());

    // Completing again must not spawn a second successor
    let second = database.tasks().complete_task(user_id, task.id).await.unwrap();
    assert!(second.successor.is_none());

    let all = database
        .tasks()
        .list_tasks(user_id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_complete_recurring_without_due_date() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Review inbox".to_owned(),
                recurrence_pattern: RecurrencePattern::Monthly,
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let before = Utc::now();
    let outcome = database.tasks().complete_task(user_id, task.id).await.unwrap();
    let successor = outcome.successor.unwrap();

    // Without a due date the successor's schedule starts from completion
    // time, advanced by one recurrence step
    let due = successor.due_date.unwrap();
    assert!(due > before + Duration::days(27));
}

// ============================================================================
// Listing + Filters
// ============================================================================

#[tokio::test]
async fn test_list_tasks_newest_first() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    for title in ["first", "second", "third"] {
        database
            .tasks()
            .create_task(
                user_id,
                NewTask {
                    title: title.to_owned(),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();
    }

    let tasks = database
        .tasks()
        .list_tasks(user_id, &TaskFilter::default())
        .await
        .unwrap();

    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_list_tasks_filters() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();
    let tasks = database.tasks();

    tasks
        .create_task(
            user_id,
            NewTask {
                title: "urgent work".to_owned(),
                priority: Priority::High,
                tags: vec!["work".to_owned()],
                ..NewTask::default()
            },
        )
        .await
        .unwrap();
    tasks
        .create_task(
            user_id,
            NewTask {
                title: "chore".to_owned(),
                priority: Priority::Low,
                tags: vec!["home".to_owned()],
                status: TaskStatus::InProgress,
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let high = tasks
        .list_tasks(
            user_id,
            &TaskFilter {
                priority: Some(Priority::High),
                ..TaskFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].title, "urgent work");

    let tagged = tasks
        .list_tasks(
            user_id,
            &TaskFilter {
                tag: Some("home".to_owned()),
                ..TaskFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].title, "chore");

    let in_progress = tasks
        .list_tasks(
            user_id,
            &TaskFilter {
                status: Some(TaskStatus::InProgress),
                ..TaskFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(in_progress.len(), 1);

    let limited = tasks
        .list_tasks(
            user_id,
            &TaskFilter {
                limit: Some(1),
                ..TaskFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

// ============================================================================
// Isolation + Delete
// ============================================================================

#[tokio::test]
async fn test_tasks_are_isolated_per_user() {
    let database = create_test_database().await.unwrap();
    let (alice, _) = create_test_user_with_email(&database, "alice@example.com")
        .await
        .unwrap();
    let (bob, _) = create_test_user_with_email(&database, "bob@example.com")
        .await
        .unwrap();

    let task = database
        .tasks()
        .create_task(
            alice,
            NewTask {
                title: "Alice's secret".to_owned(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    // Bob cannot see, update, complete, or delete Alice's task
    assert!(database.tasks().get_task(bob, task.id).await.unwrap().is_none());
    assert!(database
        .tasks()
        .list_tasks(bob, &TaskFilter::default())
        .await
        .unwrap()
        .is_empty());

    let err = database
        .tasks()
        .complete_task(bob, task.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    assert!(!database.tasks().delete_task(bob, task.id).await.unwrap());
    assert!(database.tasks().get_task(alice, task.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_task() {
    let database = create_test_database().await.unwrap();
    let (user_id, _) = create_test_user(&database).await.unwrap();

    let task = database
        .tasks()
        .create_task(
            user_id,
            NewTask {
                title: "Throwaway".to_owned(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    assert!(database.tasks().delete_task(user_id, task.id).await.unwrap());
    assert!(database.tasks().get_task(user_id, task.id).await.unwrap().is_none());
    // Second delete reports nothing removed
    assert!(!database.tasks().delete_task(user_id, task.id).await.unwrap());
}
