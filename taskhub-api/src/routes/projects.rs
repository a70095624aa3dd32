/// Project endpoints
///
/// # Endpoints
///
/// - `GET    /v1/projects`     - List projects (scope-filtered)
/// - `POST   /v1/projects`     - Create project (admin, manager)
/// - `GET    /v1/projects/:id` - Get project with roster (scope-gated)
/// - `PUT    /v1/projects/:id` - Update project, optionally replacing roster
/// - `DELETE /v1/projects/:id` - Soft-delete project (admin, manager)
///
/// Creating a project seeds the manager's own membership as `maintainer`.
/// Supplying `members` on update performs a literal full roster replace in
/// one transaction, including removing the manager's row if the list omits
/// them.

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
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskhub_shared::access::{gate, scope::ProjectScope};
use taskhub_shared::auth::middleware::Principal;
use taskhub_shared::models::project::{
    schedule_is_valid, CreateProject, Project, ProjectFilter, ProjectStatus, ProjectWithManager,
    UpdateProject,
};
use taskhub_shared::models::project_member::{MemberInput, MemberWithUser, ProjectMember};
use taskhub_shared::models::user::User;
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 3, max = 255, message = "Name must be at least 3 characters"))]
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Lifecycle status (defaults to planned)
    #[serde(default = "default_status")]
    pub status: ProjectStatus,

    /// First day of the project
    pub start_date: NaiveDate,

    /// Last day, strictly after `start_date` when set
    pub end_date: Option<NaiveDate>,

    /// Owning manager, must have role `manager` or `admin`
    pub manager_id: Uuid,

    /// Initial members to link on creation
    pub members: Option<Vec<MemberInput>>,
}

fn default_status() -> ProjectStatus {
    ProjectStatus::Planned
}

/// Update project request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    /// New name
    #[validate(length(min = 3, max = 255, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<ProjectStatus>,

    /// New start date
    pub start_date: Option<NaiveDate>,

    /// New end date
    pub end_date: Option<NaiveDate>,

    /// New manager
    pub manager_id: Option<Uuid>,

    /// Desired roster; when present the current roster is fully replaced
    pub members: Option<Vec<MemberInput>>,
}

/// Query parameters for listing projects
#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    /// Case-insensitive substring match on the name
    pub name: Option<String>,

    /// Comma-separated status filter, e.g. "planned,active"
    pub status: Option<String>,

    /// Restrict to projects owned by this manager
    pub manager_id: Option<Uuid>,
}

/// Project with manager and full roster, the detail response shape
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    /// The project with its manager
    #[serde(flatten)]
    pub project: ProjectWithManager,

    /// The membership roster
    pub members: Vec<MemberWithUser>,
}

/// Loads the detail view, or NotFound
async fn load_detail(state: &AppState, id: Uuid) -> ApiResult<ProjectDetail> {
    let project = Project::find_with_manager(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let members = ProjectMember::list_for_project(&state.db, id).await?;

    Ok(ProjectDetail { project, members })
}

/// Validates that a user exists and may own projects
///
/// Missing user is NotFound; a user with the wrong role is BadRequest, per
/// the original policy split.
async fn validated_manager(state: &AppState, manager_id: Uuid) -> ApiResult<User> {
    let manager = User::find_by_id(&state.db, manager_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Manager not found".to_string()))?;

    if !manager.role.can_manage_projects() {
        return Err(ApiError::BadRequest(
            "Selected user is not a manager".to_string(),
        ));
    }

    Ok(manager)
}

/// Create a new project (admin, manager)
///
/// Seeds the manager as a `maintainer` member, then links any supplied
/// initial members.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectDetail>)> {
    gate::require_role(&principal, gate::PROJECT_WRITE_ROLES)?;

    req.validate().map_err(validation_details)?;

    validated_manager(&state, req.manager_id).await?;

    if !schedule_is_valid(req.start_date, req.end_date) {
        return Err(ApiError::BadRequest(
            "End date must be after start date".to_string(),
        ));
    }

    // Check member users up front so the project is never created against
    // a roster that cannot be linked.
    if let Some(ref members) = req.members {
        for entry in members {
            if User::find_by_id(&state.db, entry.user_id).await?.is_none() {
                return Err(ApiError::NotFound(format!(
                    "User {} not found",
                    entry.user_id
                )));
            }
        }
    }

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            status: req.status,
            start_date: req.start_date,
            end_date: req.end_date,
            manager_id: req.manager_id,
        },
    )
    .await?;

    ProjectMember::seed_manager(&state.db, project.id, project.manager_id).await?;

    if let Some(members) = req.members {
        for entry in members {
            ProjectMember::upsert(&state.db, project.id, entry.user_id, entry.role).await?;
        }
    }

    tracing::info!(project_id = %project.id, manager_id = %project.manager_id, "Project created");

    let detail = load_detail(&state, project.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List projects, restricted to the principal's accessible set
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<Vec<ProjectWithManager>>> {
    let statuses = match query.status {
        Some(ref raw) => Some(
            raw.split(',')
                .map(|s| s.trim().parse::<ProjectStatus>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(ApiError::BadRequest)?,
        ),
        None => None,
    };

    let scope = ProjectScope::for_principal(&state.db, &principal).await?;
    let restriction = scope.as_restriction();

    let filter = ProjectFilter {
        name: query.name,
        statuses,
        manager_id: query.manager_id,
    };

    let projects = Project::list(&state.db, &filter, restriction.as_deref()).await?;
    Ok(Json(projects))
}

/// Get a project with its roster (scope-gated)
///
/// Reads are open to any authenticated role, so the combined gate runs
/// with an empty required-role set.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    let detail = load_detail(&state, id).await?;

    gate::evaluate(&state.db, &principal, &[], Some(id)).await?;

    Ok(Json(detail))
}

/// Update a project (admin, manager), optionally replacing the roster
///
/// When `members` is supplied the current roster is deleted and rebuilt
/// from the list in one transaction. This is a literal replace: a list
/// omitting the manager removes the manager's own membership, and it is
/// not re-seeded.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectDetail>> {
    gate::require_role(&principal, gate::PROJECT_WRITE_ROLES)?;

    let current = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    gate::require_project_access(&state.db, &principal, id).await?;

    req.validate().map_err(validation_details)?;

    if let Some(manager_id) = req.manager_id {
        validated_manager(&state, manager_id).await?;
    }

    if req.start_date.is_some() || req.end_date.is_some() {
        let start = req.start_date.unwrap_or(current.start_date);
        let end = req.end_date.or(current.end_date);

        if !schedule_is_valid(start, end) {
            return Err(ApiError::BadRequest(
                "End date must be after start date".to_string(),
            ));
        }
    }

    Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
            status: req.status,
            start_date: req.start_date,
            end_date: req.end_date,
            manager_id: req.manager_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if let Some(ref members) = req.members {
        ProjectMember::replace_roster(&state.db, id, members).await?;
        tracing::info!(project_id = %id, members = members.len(), "Roster replaced");
    }

    let detail = load_detail(&state, id).await?;
    Ok(Json(detail))
}

/// Soft-delete a project (admin, manager)
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    gate::require_role(&principal, gate::PROJECT_WRITE_ROLES)?;

    if Project::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    gate::require_project_access(&state.db, &principal, id).await?;

    Project::soft_delete(&state.db, id).await?;

    tracing::info!(project_id = %id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
