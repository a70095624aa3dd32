/// Principal extraction for authenticated requests
///
/// The API server validates the bearer token once per request and injects a
/// [`Principal`] into request extensions; handlers never look at the token
/// themselves. The principal carries exactly what the policy core needs,
/// the user's ID and global role, so every downstream check is a plain
/// function over this value plus storage.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskhub_shared::auth::middleware::Principal;
///
/// async fn handler(Extension(principal): Extension<Principal>) -> String {
///     format!("User: {} ({})", principal.id, principal.role.as_str())
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::UserRole;

/// The authenticated actor performing a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user ID
    pub id: Uuid,

    /// Email at token issue time
    pub email: String,

    /// Global role
    pub role: UserRole,
}

impl Principal {
    /// Builds a principal from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
            role: claims.role,
        }
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

/// Authenticates a request from its headers
///
/// Extracts the `Authorization: Bearer <token>` header, validates the
/// token, and returns the principal. This runs before any policy logic;
/// a failure here is always 401, never 403.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Principal, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, secret)?;

    Ok(Principal::from_claims(&claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authenticate_valid_bearer() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "m@example.com".to_string(), UserRole::Manager);
        let token = create_token(&claims, SECRET).unwrap();

        let principal = authenticate(&headers_with(&format!("Bearer {token}")), SECRET).unwrap();

        assert_eq!(principal.id, user_id);
        assert_eq!(principal.role, UserRole::Manager);
    }

    #[test]
    fn test_authenticate_missing_header() {
        let result = authenticate(&HeaderMap::new(), SECRET);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_authenticate_non_bearer() {
        let result = authenticate(&headers_with("Basic dXNlcjpwYXNz"), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_authenticate_bad_token() {
        let result = authenticate(&headers_with("Bearer garbage"), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
