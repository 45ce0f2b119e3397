//! Ownership-scoped task operations
//!
//! Every mutation follows the same order: load the task (`NotFound`), check
//! the caller owns it (`Forbidden`), then validate and write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::require_owner;
use crate::auth::middleware::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{NewTask, Task, TaskChanges, TaskDraft, TaskPatch};
use crate::store::Store;
use crate::validation::{finish, itemize, parse_priority, parse_status, parsed, Calendar};

const TASK_NOT_FOUND: &str = "Task not found";

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
    calendar: Calendar,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>, calendar: Calendar) -> Self {
        Self { store, calendar }
    }

    /// The caller's tasks, newest first
    pub async fn list(&self, auth: &AuthContext) -> ServiceResult<Vec<Task>> {
        Ok(self.store.list_tasks_by_owner(auth.user_id).await?)
    }

    /// Validates a draft and stores it with the caller as owner
    pub async fn create(&self, auth: &AuthContext, draft: TaskDraft) -> ServiceResult<Task> {
        self.create_at(auth, draft, Utc::now()).await
    }

    async fn create_at(
        &self,
        auth: &AuthContext,
        draft: TaskDraft,
        now: DateTime<Utc>,
    ) -> ServiceResult<Task> {
        let mut errors = draft.validate().err().unwrap_or_default();

        let status = match non_blank(draft.status.as_deref()) {
            Some(raw) => parsed(&mut errors, "status", parse_status(raw)),
            None => Some(Default::default()),
        };
        let priority = match non_blank(draft.priority.as_deref()) {
            Some(raw) => parsed(&mut errors, "priority", parse_priority(raw)),
            None => Some(Default::default()),
        };
        let due_date = match draft.due_date.as_deref() {
            Some(raw) => parsed(
                &mut errors,
                "due_date",
                self.calendar.validate_due_date(raw, now),
            ),
            None => Some(None),
        };

        let new_task = match (draft.title, draft.description, status, priority, due_date) {
            (Some(title), Some(description), Some(status), Some(priority), Some(due_date))
                if errors.is_empty() =>
            {
                NewTask {
                    user_id: auth.user_id,
                    title: title.trim().to_string(),
                    description: description.trim().to_string(),
                    status,
                    priority,
                    due_date,
                }
            }
            _ => return Err(ServiceError::Validation(itemize(&errors, TaskDraft::FIELDS))),
        };

        let task = self.store.insert_task(new_task).await?;
        info!(user_id = %auth.user_id, task_id = %task.id, "Task created");

        Ok(task)
    }

    /// Applies a partial update to a task the caller owns
    pub async fn update(
        &self,
        auth: &AuthContext,
        task_id: Uuid,
        patch: TaskPatch,
    ) -> ServiceResult<Task> {
        self.update_at(auth, task_id, patch, Utc::now()).await
    }

    async fn update_at(
        &self,
        auth: &AuthContext,
        task_id: Uuid,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> ServiceResult<Task> {
        let task = self.load_owned(auth, task_id, "update").await?;
        let changes = self.validate_patch(patch, now)?;
        if changes.is_empty() {
            return Ok(task);
        }

        let task = self
            .store
            .update_task(task.id, changes)
            .await?
            .ok_or(ServiceError::NotFound(TASK_NOT_FOUND))?;
        info!(user_id = %auth.user_id, task_id = %task.id, "Task updated");

        Ok(task)
    }

    /// Deletes a task the caller owns
    pub async fn delete(&self, auth: &AuthContext, task_id: Uuid) -> ServiceResult<()> {
        let task = self.load_owned(auth, task_id, "delete").await?;

        if !self.store.delete_task(task.id).await? {
            return Err(ServiceError::NotFound(TASK_NOT_FOUND));
        }
        info!(user_id = %auth.user_id, task_id = %task.id, "Task deleted");

        Ok(())
    }

    async fn load_owned(
        &self,
        auth: &AuthContext,
        task_id: Uuid,
        action: &str,
    ) -> ServiceResult<Task> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(ServiceError::NotFound(TASK_NOT_FOUND))?;

        if require_owner(auth, &task).is_err() {
            warn!(user_id = %auth.user_id, task_id = %task_id, action, "Rejected non-owner");
            return Err(ServiceError::Forbidden(format!(
                "You are not authorized to {} this task",
                action
            )));
        }

        Ok(task)
    }

    fn validate_patch(&self, patch: TaskPatch, now: DateTime<Utc>) -> ServiceResult<TaskChanges> {
        let mut errors = patch.validate().err().unwrap_or_default();

        let status = patch
            .status
            .and_then(|s| parsed(&mut errors, "status", parse_status(&s)));
        let priority = patch
            .priority
            .and_then(|p| parsed(&mut errors, "priority", parse_priority(&p)));
        let due_date = match patch.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => parsed(
                &mut errors,
                "due_date",
                self.calendar.validate_due_date(&raw, now),
            ),
        };

        finish(errors, TaskDraft::FIELDS)?;

        Ok(TaskChanges {
            title: patch.title.map(|t| t.trim().to_string()),
            description: patch.description.map(|d| d.trim().to_string()),
            status,
            priority,
            due_date,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
