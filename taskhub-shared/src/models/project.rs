/// Project model and database operations
///
/// Projects are owned by a manager (a user with role `manager` or `admin`)
/// and carry a membership roster in `project_members`. Visibility for
/// non-admin principals is always the union of "projects I manage" and
/// "projects I am a member of"; list queries here accept that set as an
/// explicit restriction so the scope cannot be widened by caller filters.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('planned', 'active', 'completed', 'cancelled');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     status project_status NOT NULL DEFAULT 'planned',
///     start_date DATE NOT NULL,
///     end_date DATE,
///     manager_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// Invariant: `end_date`, when present, is strictly after `start_date`.
/// Validated before any write via [`schedule_is_valid`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{UserRole, UserSummary};

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Not started yet
    Planned,

    /// In progress
    Active,

    /// Finished
    Completed,

    /// Abandoned
    Cancelled,
}

impl sqlx::postgres::PgHasArrayType for ProjectStatus {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_project_status")
    }
}

impl ProjectStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "planned",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(ProjectStatus::Planned),
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "cancelled" => Ok(ProjectStatus::Cancelled),
            other => Err(format!("Unknown project status: {other}")),
        }
    }
}

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// First day of the project
    pub start_date: NaiveDate,

    /// Last day of the project, strictly after `start_date` when set
    pub end_date: Option<NaiveDate>,

    /// Owning manager
    pub manager_id: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Project joined with its manager, the shape returned to API callers
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithManager {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// First day of the project
    pub start_date: NaiveDate,

    /// Last day of the project
    pub end_date: Option<NaiveDate>,

    /// Owning manager
    pub manager: UserSummary,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Flat row for the project + manager join
#[derive(Debug, sqlx::FromRow)]
struct ProjectManagerRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    status: ProjectStatus,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    manager_id: Uuid,
    manager_name: String,
    manager_email: String,
    manager_role: UserRole,
}

impl From<ProjectManagerRow> for ProjectWithManager {
    fn from(row: ProjectManagerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            status: row.status,
            start_date: row.start_date,
            end_date: row.end_date,
            manager: UserSummary {
                id: row.manager_id,
                name: row.manager_name,
                email: row.manager_email,
                role: row.manager_role,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a new project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// First day of the project
    pub start_date: NaiveDate,

    /// Last day, strictly after `start_date` when set
    pub end_date: Option<NaiveDate>,

    /// Owning manager, must have role `manager` or `admin`
    pub manager_id: Uuid,
}

/// Input for updating an existing project
///
/// All fields are optional; only non-None fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<ProjectStatus>,

    /// New start date
    pub start_date: Option<NaiveDate>,

    /// New end date
    pub end_date: Option<NaiveDate>,

    /// New manager, must have role `manager` or `admin`
    pub manager_id: Option<Uuid>,
}

/// Caller-supplied filters for listing projects
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Case-insensitive substring match on the name
    pub name: Option<String>,

    /// Restrict to any of these statuses
    pub statuses: Option<Vec<ProjectStatus>>,

    /// Restrict to projects owned by this manager
    pub manager_id: Option<Uuid>,
}

/// Checks the schedule invariant: `end_date`, when present, must be
/// strictly after `start_date`
pub fn schedule_is_valid(start_date: NaiveDate, end_date: Option<NaiveDate>) -> bool {
    match end_date {
        Some(end) => end > start_date,
        None => true,
    }
}

const PROJECT_MANAGER_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.status, p.start_date, p.end_date,
           p.created_at, p.updated_at,
           u.id AS manager_id, u.name AS manager_name,
           u.email AS manager_email, u.role AS manager_role
    FROM projects p
    JOIN users u ON u.id = p.manager_id
"#;

impl Project {
    /// Creates a new project
    ///
    /// Callers are expected to have validated the manager's role and the
    /// schedule invariant first; membership seeding for the manager happens
    /// separately via `ProjectMember::seed_manager`.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, status, start_date, end_date, manager_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, status, start_date, end_date,
                      manager_id, created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.manager_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a non-deleted project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, status, start_date, end_date,
                   manager_id, created_at, updated_at, deleted_at
            FROM projects
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Finds a non-deleted project joined with its manager
    pub async fn find_with_manager(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<ProjectWithManager>, sqlx::Error> {
        let sql = format!("{PROJECT_MANAGER_SELECT} WHERE p.id = $1 AND p.deleted_at IS NULL");

        let row = sqlx::query_as::<_, ProjectManagerRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(ProjectWithManager::from))
    }

    /// Lists non-deleted projects matching the caller filters, restricted
    /// to an accessible-project set
    ///
    /// `restriction` is the scope gate in filter form: `None` means no
    /// restriction (admin), while `Some(ids)` limits results to those
    /// projects; an empty slice forces an empty result rather than
    /// erroring.
    pub async fn list(
        pool: &PgPool,
        filter: &ProjectFilter,
        restriction: Option<&[Uuid]>,
    ) -> Result<Vec<ProjectWithManager>, sqlx::Error> {
        let sql = format!(
            r#"{PROJECT_MANAGER_SELECT}
            WHERE p.deleted_at IS NULL
              AND ($1::text IS NULL OR p.name ILIKE '%' || $1 || '%')
              AND ($2::project_status[] IS NULL OR p.status = ANY($2))
              AND ($3::uuid IS NULL OR p.manager_id = $3)
              AND ($4::uuid[] IS NULL OR p.id = ANY($4))
            ORDER BY p.created_at ASC
            "#
        );

        let rows = sqlx::query_as::<_, ProjectManagerRow>(&sql)
            .bind(filter.name.as_deref())
            .bind(filter.statuses.as_deref())
            .bind(filter.manager_id)
            .bind(restriction)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(ProjectWithManager::from).collect())
    }

    /// Updates a project, writing only the provided fields
    ///
    /// Returns the updated project, or None if no non-deleted project
    /// matches. Schedule and manager-role validation happen in the caller,
    /// which has both the old and new values in hand.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                manager_id = COALESCE($7, manager_id),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, description, status, start_date, end_date,
                      manager_id, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.manager_id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Soft-deletes a project
    ///
    /// Returns true if a live row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_schedule_end_after_start() {
        assert!(schedule_is_valid(date(2025, 1, 1), Some(date(2025, 12, 31))));
    }

    #[test]
    fn test_schedule_end_before_start_rejected() {
        assert!(!schedule_is_valid(date(2025, 1, 1), Some(date(2024, 1, 1))));
    }

    #[test]
    fn test_schedule_end_equal_start_rejected() {
        // Strictly after, equality is invalid
        assert!(!schedule_is_valid(date(2025, 1, 1), Some(date(2025, 1, 1))));
    }

    #[test]
    fn test_schedule_open_ended() {
        assert!(schedule_is_valid(date(2025, 1, 1), None));
    }

    #[test]
    fn test_project_status_as_str() {
        assert_eq!(ProjectStatus::Planned.as_str(), "planned");
        assert_eq!(ProjectStatus::Active.as_str(), "active");
        assert_eq!(ProjectStatus::Completed.as_str(), "completed");
        assert_eq!(ProjectStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_project_status_from_str() {
        assert_eq!("active".parse::<ProjectStatus>(), Ok(ProjectStatus::Active));
        assert!("archived".parse::<ProjectStatus>().is_err());
    }
}
