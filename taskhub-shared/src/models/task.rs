/// Task model and database operations
///
/// Tasks belong to exactly one project for their lifetime: create binds
/// `project_id`, and an update may move the task only after the caller has
/// passed the same access checks as create, for both the current and the
/// target project. Listing always goes through the accessible-project
/// restriction so callers cannot widen their scope with a `project_id`
/// filter.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'review', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'critical');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     project_id UUID NOT NULL REFERENCES projects(id),
///     assignee_id UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{UserRole, UserSummary};

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Awaiting review
    Review,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Priority of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Can wait
    Low,

    /// Normal
    Medium,

    /// Should be next
    High,

    /// Drop everything
    Critical,
}

impl TaskPriority {
    /// Converts priority to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Owning project
    pub project_id: Uuid,

    /// Optional assignee
    pub assignee_id: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Task joined with project name and assignee, the list/read shape
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithRefs {
    /// Unique task ID
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Owning project
    pub project_id: Uuid,

    /// Owning project's name
    pub project_name: String,

    /// Assignee, when one is set
    pub assignee: Option<UserSummary>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct TaskRefsRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
    project_id: Uuid,
    project_name: String,
    assignee_id: Option<Uuid>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
    assignee_role: Option<UserRole>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRefsRow> for TaskWithRefs {
    fn from(row: TaskRefsRow) -> Self {
        let assignee = match (
            row.assignee_id,
            row.assignee_name,
            row.assignee_email,
            row.assignee_role,
        ) {
            (Some(id), Some(name), Some(email), Some(role)) => Some(UserSummary {
                id,
                name,
                email,
                role,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            due_date: row.due_date,
            project_id: row.project_id,
            project_name: row.project_name,
            assignee,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a new task
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    /// Short title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Workflow status (defaults to `todo`)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority (defaults to `medium`)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Owning project
    pub project_id: Uuid,

    /// Optional assignee
    pub assignee_id: Option<Uuid>,
}

/// Input for updating an existing task
///
/// All fields are optional; only non-None fields are written. A non-None
/// `project_id` moves the task and is subject to scope checks on both ends.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date
    pub due_date: Option<DateTime<Utc>>,

    /// Target project (moves the task)
    pub project_id: Option<Uuid>,

    /// New assignee
    pub assignee_id: Option<Uuid>,
}

/// Caller-supplied filters for listing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to this status
    pub status: Option<TaskStatus>,

    /// Restrict to this priority
    pub priority: Option<TaskPriority>,

    /// Restrict to this project
    pub project_id: Option<Uuid>,

    /// Restrict to this assignee
    pub assignee_id: Option<Uuid>,

    /// Case-insensitive substring match on the title
    pub title: Option<String>,
}

const TASK_REFS_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date,
           t.project_id, p.name AS project_name,
           u.id AS assignee_id, u.name AS assignee_name,
           u.email AS assignee_email, u.role AS assignee_role,
           t.created_at, t.updated_at
    FROM tasks t
    JOIN projects p ON p.id = t.project_id
    LEFT JOIN users u ON u.id = t.assignee_id
"#;

impl Task {
    /// Creates a new task
    ///
    /// The caller is responsible for the access check on `project_id`
    /// before this runs.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, project_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, status, priority, due_date,
                      project_id, assignee_id, created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.project_id)
        .bind(data.assignee_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a non-deleted task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   project_id, assignee_id, created_at, updated_at, deleted_at
            FROM tasks
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds a non-deleted task joined with project and assignee
    pub async fn find_with_refs(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskWithRefs>, sqlx::Error> {
        let sql = format!(
            "{TASK_REFS_SELECT} WHERE t.id = $1 AND t.deleted_at IS NULL AND p.deleted_at IS NULL"
        );

        let row = sqlx::query_as::<_, TaskRefsRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(TaskWithRefs::from))
    }

    /// Lists non-deleted tasks matching the caller filters, restricted to
    /// an accessible-project set
    ///
    /// `restriction` composes with the caller's own `project_id` filter by
    /// intersection: a requested project outside the accessible set yields
    /// an empty list, never an error and never leaked rows. `None` means no
    /// restriction (admin).
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        restriction: Option<&[Uuid]>,
    ) -> Result<Vec<TaskWithRefs>, sqlx::Error> {
        let sql = format!(
            r#"{TASK_REFS_SELECT}
            WHERE t.deleted_at IS NULL
              AND p.deleted_at IS NULL
              AND ($1::task_status IS NULL OR t.status = $1)
              AND ($2::task_priority IS NULL OR t.priority = $2)
              AND ($3::uuid IS NULL OR t.project_id = $3)
              AND ($4::uuid IS NULL OR t.assignee_id = $4)
              AND ($5::text IS NULL OR t.title ILIKE '%' || $5 || '%')
              AND ($6::uuid[] IS NULL OR t.project_id = ANY($6))
            ORDER BY t.created_at ASC
            "#
        );

        let rows = sqlx::query_as::<_, TaskRefsRow>(&sql)
            .bind(filter.status)
            .bind(filter.priority)
            .bind(filter.project_id)
            .bind(filter.assignee_id)
            .bind(filter.title.as_deref())
            .bind(restriction)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(TaskWithRefs::from).collect())
    }

    /// Updates a task, writing only the provided fields
    ///
    /// Returns the updated task, or None if no non-deleted task matches.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                due_date = COALESCE($6, due_date),
                project_id = COALESCE($7, project_id),
                assignee_id = COALESCE($8, assignee_id),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, title, description, status, priority, due_date,
                      project_id, assignee_id, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.project_id)
        .bind(data.assignee_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Soft-deletes a task
    ///
    /// Returns true if a live row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
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

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Review.as_str(), "review");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_task_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_task_status_serde_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let status: TaskStatus = serde_json::from_str("\"review\"").unwrap();
        assert_eq!(status, TaskStatus::Review);
    }

    #[test]
    fn test_create_task_deserializes_with_defaults() {
        let task: CreateTask = serde_json::from_str(
            r#"{"title": "Implement login", "project_id": "550e8400-e29b-41d4-a716-446655440000"}"#,
        )
        .unwrap();

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.assignee_id.is_none());
    }
}
