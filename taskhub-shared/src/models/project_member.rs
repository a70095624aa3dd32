/// Project membership roster and reconciliation
///
/// This module owns every write to the `project_members` table. Rows are
/// created in exactly three ways: seeding the manager when a project is
/// created, explicit add/update/remove member operations, and a full roster
/// replace on project update. Task or comment writes never touch the roster.
///
/// Membership is what grants visibility: any row, regardless of member role,
/// puts the project into the user's accessible set. Member roles only
/// differentiate mutation rights where the surrounding layer chooses to
/// enforce them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('viewer', 'contributor', 'maintainer');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'viewer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```
///
/// The unique constraint carries the one-row-per-pair invariant; all
/// creation paths go through `ON CONFLICT` so concurrent adds for the same
/// pair converge to a single row instead of racing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use super::user::UserSummary;

/// Roles within a project roster
///
/// All three grant visibility; they differ only in mutation rights where
/// enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Read-only participant
    Viewer,

    /// Works on tasks
    Contributor,

    /// Manages the project's contents; seeded for the project manager
    Maintainer,
}

impl MemberRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Viewer => "viewer",
            MemberRole::Contributor => "contributor",
            MemberRole::Maintainer => "maintainer",
        }
    }
}

/// Membership row linking a user to a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Row ID
    pub id: Uuid,

    /// Project
    pub project_id: Uuid,

    /// User
    pub user_id: Uuid,

    /// Role within the project
    pub role: MemberRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,

    /// When the membership was last updated
    pub updated_at: DateTime<Utc>,
}

/// One desired roster entry, as supplied on project create/update
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct MemberInput {
    /// User to link
    pub user_id: Uuid,

    /// Role to assign
    pub role: MemberRole,
}

/// Membership joined with the member's user summary
#[derive(Debug, Clone, Serialize)]
pub struct MemberWithUser {
    /// Membership row ID
    pub id: Uuid,

    /// Role within the project
    pub role: MemberRole,

    /// The member
    pub user: UserSummary,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct MemberUserRow {
    id: Uuid,
    role: MemberRole,
    created_at: DateTime<Utc>,
    user_id: Uuid,
    user_name: String,
    user_email: String,
    user_role: super::user::UserRole,
}

impl From<MemberUserRow> for MemberWithUser {
    fn from(row: MemberUserRow) -> Self {
        Self {
            id: row.id,
            role: row.role,
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                role: row.user_role,
            },
            created_at: row.created_at,
        }
    }
}

/// Error type for roster reconciliation
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// A desired member references a user that does not exist
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ProjectMember {
    /// Finds the membership row for a (project, user) pair
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, created_at, updated_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Seeds the project manager's own membership as `maintainer`
    ///
    /// Find-or-create, not upsert: if the manager already has a row with a
    /// different role from an earlier explicit assignment, that role is
    /// left alone. Idempotent; calling twice never duplicates the row.
    pub async fn seed_manager(
        pool: &PgPool,
        project_id: Uuid,
        manager_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, 'maintainer')
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(manager_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Creates or updates the single membership row for a pair
    ///
    /// An existing row is moved to the requested role. Concurrent calls for
    /// the same pair converge on the unique constraint instead of producing
    /// duplicates.
    pub async fn upsert(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id)
            DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
            RETURNING id, project_id, user_id, role, created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Updates the role of an existing membership
    ///
    /// Returns None when no row exists for the pair; it is not created.
    pub async fn update_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            UPDATE project_members
            SET role = $3, updated_at = NOW()
            WHERE project_id = $1 AND user_id = $2
            RETURNING id, project_id, user_id, role, created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Removes a user from a project's roster
    ///
    /// Returns true if a row was deleted.
    pub async fn remove(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a project's roster with member user details
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberUserRow>(
            r#"
            SELECT m.id, m.role, m.created_at,
                   u.id AS user_id, u.name AS user_name,
                   u.email AS user_email, u.role AS user_role
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(MemberWithUser::from).collect())
    }

    /// Replaces a project's entire roster with the desired member list
    ///
    /// Runs in a single transaction: every current row is deleted, then each
    /// desired entry is inserted after checking its user exists. A failure
    /// anywhere rolls the whole replace back, so the roster is never left in
    /// a torn half-replaced state.
    ///
    /// This is a literal full replace, not a diff. If the desired list omits
    /// the project's own manager, the manager's seeded row is removed along
    /// with the rest and is not re-seeded here.
    ///
    /// Duplicate `user_id`s in the input collapse to one row; the last entry
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::UserNotFound` if any desired entry references a
    /// missing (or soft-deleted) user; nothing is changed in that case.
    pub async fn replace_roster(
        pool: &PgPool,
        project_id: Uuid,
        desired: &[MemberInput],
    ) -> Result<(), RosterError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        for entry in desired {
            let user_exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)",
            )
            .bind(entry.user_id)
            .fetch_one(&mut *tx)
            .await?;

            if !user_exists {
                return Err(RosterError::UserNotFound(entry.user_id));
            }

            sqlx::query(
                r#"
                INSERT INTO project_members (project_id, user_id, role)
                VALUES ($1, $2, $3)
                ON CONFLICT (project_id, user_id)
                DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
                "#,
            )
            .bind(project_id)
            .bind(entry.user_id)
            .bind(entry.role)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Computes the set of project IDs a user may access
    ///
    /// The union of projects the user manages and projects where a
    /// membership row exists for them, any role. Soft-deleted projects are
    /// excluded. Returns an empty set, not an error, when the user has no
    /// projects.
    ///
    /// Admin principals never consult this: the admin policy is enforced
    /// before scoping and bypasses the index entirely.
    pub async fn accessible_project_ids(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<HashSet<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT p.id
            FROM projects p
            WHERE p.deleted_at IS NULL AND p.manager_id = $1
            UNION
            SELECT m.project_id
            FROM project_members m
            JOIN projects p ON p.id = m.project_id AND p.deleted_at IS NULL
            WHERE m.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(ids.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Viewer.as_str(), "viewer");
        assert_eq!(MemberRole::Contributor.as_str(), "contributor");
        assert_eq!(MemberRole::Maintainer.as_str(), "maintainer");
    }

    #[test]
    fn test_member_role_serde_lowercase() {
        let json = serde_json::to_string(&MemberRole::Maintainer).unwrap();
        assert_eq!(json, "\"maintainer\"");

        let role: MemberRole = serde_json::from_str("\"contributor\"").unwrap();
        assert_eq!(role, MemberRole::Contributor);
    }

    #[test]
    fn test_roster_error_display() {
        let id = Uuid::new_v4();
        let err = RosterError::UserNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    // Reconciliation and index behavior against a live database is covered
    // in tests/access_engine_tests.rs
}
