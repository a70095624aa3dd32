/// User management endpoints
///
/// # Endpoints
///
/// - `GET    /v1/users`      - List users (any authenticated role)
/// - `POST   /v1/users`      - Create user (admin only)
/// - `GET    /v1/users/:id`  - Get user (any authenticated role)
/// - `PUT    /v1/users/:id`  - Update user (admin, or the user themselves)
/// - `DELETE /v1/users/:id`  - Soft-delete user (admin only)
///
/// User accounts carry no project scope, so only the role gate applies
/// here.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::validation_details,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::access::gate;
use taskhub_shared::auth::middleware::Principal;
use taskhub_shared::auth::password;
use taskhub_shared::models::user::{CreateUser, UpdateUser, User, UserRole, UserSummary};
use uuid::Uuid;
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password, hashed before storage
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Global role (defaults to developer)
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Developer
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New display name
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,

    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New plaintext password, hashed before storage
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    /// New global role (admin only)
    pub role: Option<UserRole>,
}

/// Create a new user (admin only)
///
/// # Errors
///
/// - `403 Forbidden`: principal is not an admin
/// - `409 Conflict`: email already in use by a non-deleted account
/// - `422 Unprocessable Entity`: validation failed
pub async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<UserSummary>> {
    gate::require_role(&principal, gate::USER_ADMIN_ROLES)?;

    req.validate().map_err(validation_details)?;

    password::validate_password_strength(&req.password)
        .map_err(ApiError::BadRequest)?;

    if User::email_in_use(&state.db, &req.email, None).await? {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");

    Ok(Json(UserSummary::from(user)))
}

/// List all users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserSummary>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserSummary::from(user)))
}

/// Update a user
///
/// Admins may update anyone, including roles; everyone else may only
/// update their own name, email, and password.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserSummary>> {
    let is_self = principal.id == id;
    if !is_self {
        gate::require_role(&principal, gate::USER_ADMIN_ROLES)?;
    }

    if req.role.is_some() && principal.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Only admins may change roles".to_string(),
        ));
    }

    req.validate().map_err(validation_details)?;

    if let Some(ref email) = req.email {
        if User::email_in_use(&state.db, email, Some(id)).await? {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }
    }

    let password_hash = match req.password {
        Some(ref plaintext) => {
            password::validate_password_strength(plaintext).map_err(ApiError::BadRequest)?;
            Some(password::hash_password(plaintext)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserSummary::from(user)))
}

/// Soft-delete a user (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<axum::http::StatusCode> {
    gate::require_role(&principal, gate::USER_ADMIN_ROLES)?;

    let deleted = User::soft_delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "User deleted");

    Ok(axum::http::StatusCode::NO_CONTENT)
}
