/// Task comment endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks/:id/comments` - List a task's comments (scope-gated)
/// - `POST   /v1/tasks/:id/comments` - Comment on a task (scope-gated)
/// - `PUT    /v1/comments/:id`       - Edit own comment (author or admin)
/// - `DELETE /v1/comments/:id`       - Delete own comment (author or admin)
///
/// Comments inherit their task's project for the scope gate; any member
/// role may comment.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::validation_details,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::access::gate;
use taskhub_shared::auth::middleware::Principal;
use taskhub_shared::models::task::Task;
use taskhub_shared::models::task_comment::{CommentWithAuthor, TaskComment};
use taskhub_shared::models::user::UserRole;
use uuid::Uuid;
use validator::Validate;

/// Create/update comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    /// Comment body
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Resolves a task and gates the principal on its project
async fn scoped_task(state: &AppState, principal: &Principal, task_id: Uuid) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    gate::require_project_access(&state.db, principal, task.project_id).await?;

    Ok(task)
}

/// List a task's comments
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentWithAuthor>>> {
    scoped_task(&state, &principal, task_id).await?;

    let comments = TaskComment::list_for_task(&state.db, task_id).await?;
    Ok(Json(comments))
}

/// Comment on a task
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<TaskComment>)> {
    scoped_task(&state, &principal, task_id).await?;

    req.validate().map_err(validation_details)?;

    let comment = TaskComment::create(&state.db, task_id, principal.id, req.content).await?;

    tracing::info!(comment_id = %comment.id, task_id = %task_id, "Comment created");

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Loads a comment and checks the principal may modify it
///
/// Authors may edit their own comments; admins may edit any. The scope
/// gate still applies so a former member cannot touch old comments.
async fn guarded_comment(
    state: &AppState,
    principal: &Principal,
    comment_id: Uuid,
) -> ApiResult<TaskComment> {
    let comment = TaskComment::find_by_id(&state.db, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != principal.id && principal.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Only the author may modify this comment".to_string(),
        ));
    }

    scoped_task(state, principal, comment.task_id).await?;

    Ok(comment)
}

/// Edit a comment (author or admin)
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<Json<TaskComment>> {
    guarded_comment(&state, &principal, id).await?;

    req.validate().map_err(validation_details)?;

    let comment = TaskComment::update_content(&state.db, id, req.content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(Json(comment))
}

/// Delete a comment (author or admin)
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    guarded_comment(&state, &principal, id).await?;

    let deleted = TaskComment::soft_delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
