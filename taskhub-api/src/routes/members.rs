/// Project roster endpoints
///
/// # Endpoints
///
/// - `POST   /v1/projects/:id/members`           - Add or re-role a member
/// - `PUT    /v1/projects/:id/members/:user_id`  - Update a member's role
/// - `DELETE /v1/projects/:id/members/:user_id`  - Remove a member
///
/// All three require the project-write role gate plus scope on the project.
/// Add is an idempotent upsert: adding an existing member moves them to the
/// requested role rather than failing or duplicating. Update and remove
/// require the membership to exist and answer NotFound otherwise.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::projects::ProjectDetail,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::access::gate;
use taskhub_shared::auth::middleware::Principal;
use taskhub_shared::models::project::Project;
use taskhub_shared::models::project_member::{MemberRole, MemberWithUser, ProjectMember};
use taskhub_shared::models::user::User;
use uuid::Uuid;

/// Add member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to link
    pub user_id: Uuid,

    /// Role to assign
    pub role: MemberRole,
}

/// Update member request
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// New role
    pub role: MemberRole,
}

/// Common gate for all roster mutations: role gate, project exists, scope
async fn guard_roster_write(
    state: &AppState,
    principal: &Principal,
    project_id: Uuid,
) -> ApiResult<()> {
    gate::require_role(principal, gate::PROJECT_WRITE_ROLES)?;

    if Project::find_by_id(&state.db, project_id).await?.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    gate::require_project_access(&state.db, principal, project_id).await?;

    Ok(())
}

/// Add a user to a project's roster, or move them to the requested role
///
/// Returns the refreshed project-with-members view.
pub async fn add_member(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProjectDetail>)> {
    guard_roster_write(&state, &principal, project_id).await?;

    if User::find_by_id(&state.db, req.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    ProjectMember::upsert(&state.db, project_id, req.user_id, req.role).await?;

    tracing::info!(
        project_id = %project_id,
        user_id = %req.user_id,
        role = req.role.as_str(),
        "Member added"
    );

    let project = Project::find_with_manager(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    let members = ProjectMember::list_for_project(&state.db, project_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectDetail { project, members }),
    ))
}

/// Update a member's role
pub async fn update_member(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRequest>,
) -> ApiResult<Json<MemberWithUser>> {
    guard_roster_write(&state, &principal, project_id).await?;

    ProjectMember::update_role(&state.db, project_id, user_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    let members = ProjectMember::list_for_project(&state.db, project_id).await?;
    let member = members
        .into_iter()
        .find(|m| m.user.id == user_id)
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    Ok(Json(member))
}

/// Remove a member from a project's roster
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    guard_roster_write(&state, &principal, project_id).await?;

    let removed = ProjectMember::remove(&state.db, project_id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    tracing::info!(project_id = %project_id, user_id = %user_id, "Member removed");

    Ok(StatusCode::NO_CONTENT)
}
