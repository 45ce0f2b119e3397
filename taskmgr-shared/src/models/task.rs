//! Task model and database operations
//!
//! Tasks are personal to-do records. Each task has exactly one owner (the
//! user who created it) and the owner never changes.
//!
//! # Status
//!
//! ```text
//! pending ⇄ in-progress ⇄ completed   (any state may move to any other)
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
//! CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     title VARCHAR(100) NOT NULL,
//!     description VARCHAR(2000) NOT NULL,
//!     status task_status NOT NULL DEFAULT 'pending',
//!     priority task_priority NOT NULL DEFAULT 'medium',
//!     due_date TIMESTAMPTZ,
//!     user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use taskmgr_shared::models::task::{NewTask, Task, TaskPriority, TaskStatus};
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
//! let task = Task::create(&pool, NewTask {
//!     user_id: owner,
//!     title: "Buy milk".to_string(),
//!     description: "2%".to_string(),
//!     status: TaskStatus::Pending,
//!     priority: TaskPriority::Medium,
//!     due_date: None,
//! }).await?;
//!
//! let mine = Task::list_by_owner(&pool, owner).await?;
//! assert_eq!(mine[0].id, task.id);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::double_option;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Pending,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!("unknown task priority: {}", other)),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Title (3-100 characters, trimmed)
    pub title: String,

    /// Required description (at most 2000 characters)
    pub description: String,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// Owning user. Set at creation and never changed.
    #[serde(rename = "user")]
    pub user_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Validated input for inserting a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
}

/// Validated partial update for a task
///
/// `None` leaves a field untouched. `due_date: Some(None)` clears the due
/// date. The owner is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Applies the present fields to `task` in place
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

/// Raw task creation payload as sent by clients
///
/// Enum and date fields stay as strings here so that bad values surface as
/// itemized validation errors instead of deserialization failures.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[validate(
        required(message = "Please add a title"),
        custom(function = "crate::validation::check_title")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Please add a description"),
        custom(function = "crate::validation::check_description")
    )]
    pub description: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

impl TaskDraft {
    /// Field order for itemized validation errors
    pub const FIELDS: &'static [&'static str] =
        &["title", "description", "status", "priority", "due_date"];
}

/// Raw partial task update as sent by clients
///
/// `dueDate: null` clears the due date; an absent `dueDate` leaves it alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[validate(custom(function = "crate::validation::check_title"))]
    pub title: Option<String>,

    #[validate(custom(function = "crate::validation::check_description"))]
    pub description: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
}

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, user_id, created_at";

impl Task {
    /// Inserts a new task
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist (foreign key) or the
    /// database is unreachable
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (user_id, title, description, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID regardless of owner
    ///
    /// Ownership is checked by the caller so that "missing" and "not yours"
    /// stay distinguishable.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's tasks, newest first
    pub async fn list_by_owner(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Applies a partial update
    ///
    /// Only present fields are written. Returns `None` if the task does not
    /// exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        // Build dynamic update query based on which fields are present
        let mut assignments: Vec<String> = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            assignments.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push(format!("description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            assignments.push(format!("status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            assignments.push(format!("priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            assignments.push(format!("due_date = ${}", bind_count));
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 RETURNING {}",
            assignments.join(", "),
            TASK_COLUMNS
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task. Returns false if it did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
