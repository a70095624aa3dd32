/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks`     - List tasks (scope-filtered)
/// - `POST   /v1/tasks`     - Create task (admin, manager; scope-gated)
/// - `GET    /v1/tasks/:id` - Get task (scope-gated)
/// - `PUT    /v1/tasks/:id` - Update task (any role; scope-gated both ends)
/// - `DELETE /v1/tasks/:id` - Soft-delete task (admin, manager; scope-gated)
///
/// A task belongs to exactly one project for its lifetime; an update may
/// move it, in which case the principal needs scope on both the current and
/// the target project.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::validation_details,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskhub_shared::access::{gate, scope::ProjectScope};
use taskhub_shared::auth::middleware::Principal;
use taskhub_shared::models::project::Project;
use taskhub_shared::models::task::{
    CreateTask, Task, TaskFilter, TaskPriority, TaskStatus, TaskWithRefs, UpdateTask,
};
use taskhub_shared::models::user::User;
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Short title
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Workflow status (defaults to todo)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Owning project
    pub project_id: Uuid,

    /// Optional assignee
    pub assignee_id: Option<Uuid>,
}

/// Update task request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date
    pub due_date: Option<DateTime<Utc>>,

    /// Target project (moves the task)
    pub project_id: Option<Uuid>,

    /// New assignee
    pub assignee_id: Option<Uuid>,
}

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Restrict to this status
    pub status: Option<TaskStatus>,

    /// Restrict to this priority
    pub priority: Option<TaskPriority>,

    /// Restrict to this project
    pub project_id: Option<Uuid>,

    /// Restrict to this assignee
    pub assignee_id: Option<Uuid>,

    /// Case-insensitive substring match on the title
    pub title: Option<String>,
}

/// Checks that an assignee user exists
async fn validated_assignee(state: &AppState, assignee_id: Uuid) -> ApiResult<()> {
    if User::find_by_id(&state.db, assignee_id).await?.is_none() {
        return Err(ApiError::NotFound("Assignee not found".to_string()));
    }
    Ok(())
}

/// Create a new task (admin, manager)
///
/// Non-admin principals need scope on the target project.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskWithRefs>)> {
    gate::require_role(&principal, gate::TASK_WRITE_ROLES)?;

    req.validate().map_err(validation_details)?;

    if Project::find_by_id(&state.db, req.project_id).await?.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    gate::require_project_access(&state.db, &principal, req.project_id).await?;

    if let Some(assignee_id) = req.assignee_id {
        validated_assignee(&state, assignee_id).await?;
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            project_id: req.project_id,
            assignee_id: req.assignee_id,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, project_id = %task.project_id, "Task created");

    let task = Task::find_with_refs(&state.db, task.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List tasks, restricted to the principal's accessible projects
///
/// The scope restriction intersects with any caller-supplied `project_id`
/// filter: asking for a project outside the accessible set yields an empty
/// list, never an error and never another project's tasks.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<TaskWithRefs>>> {
    let scope = ProjectScope::for_principal(&state.db, &principal).await?;
    let restriction = scope.as_restriction();

    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        project_id: query.project_id,
        assignee_id: query.assignee_id,
        title: query.title,
    };

    let tasks = Task::list(&state.db, &filter, restriction.as_deref()).await?;
    Ok(Json(tasks))
}

/// Get a task by ID (scope-gated)
pub async fn get_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskWithRefs>> {
    let task = Task::find_with_refs(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    gate::require_project_access(&state.db, &principal, task.project_id).await?;

    Ok(Json(task))
}

/// Update a task (any authenticated role)
///
/// Non-admin principals need scope on the task's current project, and on
/// the target project when the update moves the task.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskWithRefs>> {
    let current = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    gate::require_project_access(&state.db, &principal, current.project_id).await?;

    req.validate().map_err(validation_details)?;

    if let Some(target) = req.project_id {
        if target != current.project_id {
            if Project::find_by_id(&state.db, target).await?.is_none() {
                return Err(ApiError::NotFound("Project not found".to_string()));
            }
            gate::require_project_access(&state.db, &principal, target).await?;
        }
    }

    if let Some(assignee_id) = req.assignee_id {
        validated_assignee(&state, assignee_id).await?;
    }

    Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            project_id: req.project_id,
            assignee_id: req.assignee_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let task = Task::find_with_refs(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Soft-delete a task (admin, manager)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    gate::require_role(&principal, gate::TASK_WRITE_ROLES)?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    gate::require_project_access(&state.db, &principal, task.project_id).await?;

    Task::soft_delete(&state.db, id).await?;

    tracing::info!(task_id = %id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
