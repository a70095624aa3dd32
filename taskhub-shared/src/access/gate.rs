/// Access gate: explicit role and scope checks
///
/// Authorization in Taskhub is a pair of plain functions called at the top
/// of every handler, not an annotation or middleware that fires by
/// reflection. The role gate is pure and synchronous; the scope gate reads
/// the membership index. Both produce an [`AccessError`] that the API layer
/// maps to 403, distinct from 404, because "you may not see
/// this" and "this does not exist" are different answers.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::middleware::Principal;
use crate::models::project_member::ProjectMember;
use crate::models::user::UserRole;

/// Roles allowed to create, update or delete projects and manage rosters
pub const PROJECT_WRITE_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Manager];

/// Roles allowed to create and delete tasks
pub const TASK_WRITE_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Manager];

/// Roles allowed to manage user accounts
pub const USER_ADMIN_ROLES: &[UserRole] = &[UserRole::Admin];

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The principal's global role is not in the operation's required set
    #[error("Insufficient role: requires one of {required:?}, has {actual:?}")]
    InsufficientRole {
        required: Vec<UserRole>,
        actual: UserRole,
    },

    /// The principal has no access to the resource's project
    #[error("Access to project {0} denied")]
    ProjectDenied(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Role gate: checks the principal's global role against a required set
///
/// An empty `required` slice means the operation is open to any
/// authenticated role and the gate passes unconditionally.
pub fn require_role(principal: &Principal, required: &[UserRole]) -> Result<(), AccessError> {
    if required.is_empty() || required.contains(&principal.role) {
        return Ok(());
    }

    Err(AccessError::InsufficientRole {
        required: required.to_vec(),
        actual: principal.role,
    })
}

/// Scope gate: checks that a non-admin principal may access a project
///
/// Admins pass without consulting the membership index. For everyone else
/// the project must be in their accessible set: managed or member, any
/// member role.
pub async fn require_project_access(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
) -> Result<(), AccessError> {
    if principal.role == UserRole::Admin {
        return Ok(());
    }

    let accessible = ProjectMember::accessible_project_ids(pool, principal.id).await?;
    if accessible.contains(&project_id) {
        Ok(())
    } else {
        Err(AccessError::ProjectDenied(project_id))
    }
}

/// Combined evaluation: role gate, then scope gate
///
/// `project_id` is None for operations with no project scope (e.g. user
/// management), in which case only the role gate runs.
pub async fn evaluate(
    pool: &PgPool,
    principal: &Principal,
    required: &[UserRole],
    project_id: Option<Uuid>,
) -> Result<(), AccessError> {
    require_role(principal, required)?;

    if let Some(project_id) = project_id {
        require_project_access(pool, principal, project_id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: UserRole) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_role_gate_allows_listed_roles() {
        assert!(require_role(&principal(UserRole::Admin), PROJECT_WRITE_ROLES).is_ok());
        assert!(require_role(&principal(UserRole::Manager), PROJECT_WRITE_ROLES).is_ok());
    }

    #[test]
    fn test_role_gate_denies_unlisted_role() {
        let err = require_role(&principal(UserRole::Developer), PROJECT_WRITE_ROLES)
            .expect_err("developer must not pass the project write gate");

        match err {
            AccessError::InsufficientRole { actual, .. } => {
                assert_eq!(actual, UserRole::Developer);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_required_set_is_open() {
        assert!(require_role(&principal(UserRole::Developer), &[]).is_ok());
        assert!(require_role(&principal(UserRole::Admin), &[]).is_ok());
    }

    #[test]
    fn test_user_admin_gate() {
        assert!(require_role(&principal(UserRole::Admin), USER_ADMIN_ROLES).is_ok());
        assert!(require_role(&principal(UserRole::Manager), USER_ADMIN_ROLES).is_err());
        assert!(require_role(&principal(UserRole::Developer), USER_ADMIN_ROLES).is_err());
    }

    #[test]
    fn test_access_error_display() {
        let id = Uuid::new_v4();
        let err = AccessError::ProjectDenied(id);
        assert!(err.to_string().contains("denied"));
    }
}
