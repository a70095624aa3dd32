/// Project scope: the accessible-project set in decision and filter form
///
/// A [`ProjectScope`] is computed once per request from the membership
/// index and then applied either as a point check (`permits`) for
/// single-resource reads and mutations, or as a query restriction
/// (`as_restriction`) for list operations. Because the restriction is
/// intersected with caller filters, a caller-supplied `project_id` outside
/// the accessible set yields an empty result rather than an error, and
/// can never widen what the principal sees.

use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::auth::middleware::Principal;
use crate::models::project_member::ProjectMember;
use crate::models::user::UserRole;

/// The set of projects a principal may see and touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    /// Admin: everything, no restriction
    All,

    /// Non-admin: exactly these projects (may be empty)
    Member(HashSet<Uuid>),
}

impl ProjectScope {
    /// Computes the scope for a principal from current storage
    ///
    /// Admins get [`ProjectScope::All`] without touching the membership
    /// index; everyone else gets the union of managed and member projects.
    pub async fn for_principal(
        pool: &PgPool,
        principal: &Principal,
    ) -> Result<Self, sqlx::Error> {
        if principal.role == UserRole::Admin {
            return Ok(ProjectScope::All);
        }

        let ids = ProjectMember::accessible_project_ids(pool, principal.id).await?;
        Ok(ProjectScope::Member(ids))
    }

    /// Point check: may the principal touch this project?
    pub fn permits(&self, project_id: Uuid) -> bool {
        match self {
            ProjectScope::All => true,
            ProjectScope::Member(ids) => ids.contains(&project_id),
        }
    }

    /// Filter form for list queries
    ///
    /// `None` means unrestricted (admin). `Some(ids)` restricts the listing
    /// predicate to those projects; an empty vec matches nothing, which is
    /// exactly the forced-empty behavior for principals with no projects.
    pub fn as_restriction(&self) -> Option<Vec<Uuid>> {
        match self {
            ProjectScope::All => None,
            ProjectScope::Member(ids) => Some(ids.iter().copied().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_permits_everything() {
        let scope = ProjectScope::All;
        assert!(scope.permits(Uuid::new_v4()));
        assert_eq!(scope.as_restriction(), None);
    }

    #[test]
    fn test_member_permits_only_contained() {
        let inside = Uuid::new_v4();
        let outside = Uuid::new_v4();
        let scope = ProjectScope::Member([inside].into_iter().collect());

        assert!(scope.permits(inside));
        assert!(!scope.permits(outside));
    }

    #[test]
    fn test_empty_member_scope_forces_empty_restriction() {
        let scope = ProjectScope::Member(HashSet::new());

        assert!(!scope.permits(Uuid::new_v4()));

        // An empty restriction must be Some(empty), not None: None would
        // mean unrestricted and leak every project.
        let restriction = scope.as_restriction().unwrap();
        assert!(restriction.is_empty());
    }

    #[test]
    fn test_member_restriction_carries_all_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let scope = ProjectScope::Member([a, b].into_iter().collect());

        let mut restriction = scope.as_restriction().unwrap();
        restriction.sort();
        let mut expected = vec![a, b];
        expected.sort();

        assert_eq!(restriction, expected);
    }
}
