/// Task endpoints
///
/// All routes require authentication and only ever touch the caller's own
/// tasks.
///
/// # Endpoints
///
/// - `GET /api/task` - List the caller's tasks, newest first
/// - `POST /api/task` - Create a task
/// - `PUT /api/task/:id` - Partially update a task
/// - `DELETE /api/task/:id` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use taskmgr_shared::{
    auth::middleware::AuthContext,
    models::task::{Task, TaskDraft, TaskPatch},
};
use uuid::Uuid;

/// Envelope for task responses
#[derive(Debug, Serialize)]
pub struct TaskEnvelope<T> {
    pub success: bool,

    /// Number of items in `data`, list responses only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    pub message: String,
    pub data: T,
}

impl<T> TaskEnvelope<T> {
    fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            count: None,
            message: message.to_string(),
            data,
        }
    }
}

/// Empty `data` object for delete responses
#[derive(Debug, Serialize)]
pub struct Empty {}

// Ids that don't parse can't name an existing task.
fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Task not found".to_string()))
}

/// List the caller's tasks
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "count": 1,
///   "message": "Tasks fetched successfully",
///   "data": [{ "id": "uuid", "title": "Buy milk", "status": "pending", ... }]
/// }
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<TaskEnvelope<Vec<Task>>>> {
    let tasks = state.tasks.list(&auth).await?;

    let mut envelope = TaskEnvelope::ok("Tasks fetched successfully", tasks);
    envelope.count = Some(envelope.data.len());

    Ok(Json(envelope))
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /api/task
/// Content-Type: application/json
///
/// {
///   "title": "Buy milk",
///   "description": "2%",
///   "priority": "high",
///   "dueDate": "2030-01-01"
/// }
/// ```
///
/// `status` defaults to `pending` and `priority` to `medium`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<TaskDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskEnvelope<Task>>)> {
    let Json(draft) = payload?;

    let task = state.tasks.create(&auth, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskEnvelope::ok("Task created!", task)),
    ))
}

/// Partially update a task
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: The task belongs to someone else
/// - `404 Not Found`: No such task
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Json<TaskEnvelope<Task>>> {
    let task_id = parse_task_id(&id)?;
    let Json(patch) = payload?;

    let task = state.tasks.update(&auth, task_id, patch).await?;

    Ok(Json(TaskEnvelope::ok("Task updated successfully", task)))
}

/// Delete a task
///
/// # Errors
///
/// - `403 Forbidden`: The task belongs to someone else
/// - `404 Not Found`: No such task
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskEnvelope<Empty>>> {
    let task_id = parse_task_id(&id)?;

    state.tasks.delete(&auth, task_id).await?;

    Ok(Json(TaskEnvelope::ok("Task deleted successfully", Empty {})))
}
