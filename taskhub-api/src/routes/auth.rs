/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Authenticate and receive a bearer token
///
/// Login is the only place credentials are touched; every other endpoint
/// consumes the resulting token via the JWT middleware layer.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskhub_shared::auth::{jwt, password};
use taskhub_shared::models::user::{User, UserSummary};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub access_token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Token lifetime in seconds
    pub expires_in: i64,

    /// The authenticated user
    pub user: UserSummary,
}

/// Converts validator errors into the API's validation error shape
pub(crate) fn validation_details(errors: validator::ValidationErrors) -> ApiError {
    let details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    ApiError::ValidationError(details)
}

/// Login endpoint
///
/// Verifies the email/password pair and issues a signed access token
/// carrying the user's ID and global role.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password, deliberately the
///   same answer for both
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(validation_details)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let password_ok = password::verify_password(&req.password, &user.password_hash)?;
    if !password_ok {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let claims = jwt::Claims::new(user.id, user.email.clone(), user.role);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt::ACCESS_TOKEN_TTL_SECONDS,
        user: UserSummary::from(user),
    }))
}
