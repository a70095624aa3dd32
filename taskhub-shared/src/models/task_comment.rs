/// Task comment model
///
/// Comments hang off a task and inherit its project for access checks; the
/// comment itself stores only `task_id` and `author_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{UserRole, UserSummary};

/// Comment on a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskComment {
    /// Unique comment ID
    pub id: Uuid,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Author
    pub author_id: Uuid,

    /// Comment body
    pub content: String,

    /// When the comment was created
    pub created_at: DateTime<Utc>,

    /// When the comment was last updated
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Comment joined with its author
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    /// Unique comment ID
    pub id: Uuid,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Comment body
    pub content: String,

    /// Author
    pub author: UserSummary,

    /// When the comment was created
    pub created_at: DateTime<Utc>,

    /// When the comment was last updated
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CommentAuthorRow {
    id: Uuid,
    task_id: Uuid,
    content: String,
    author_id: Uuid,
    author_name: String,
    author_email: String,
    author_role: UserRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentAuthorRow> for CommentWithAuthor {
    fn from(row: CommentAuthorRow) -> Self {
        Self {
            id: row.id,
            task_id: row.task_id,
            content: row.content,
            author: UserSummary {
                id: row.author_id,
                name: row.author_name,
                email: row.author_email,
                role: row.author_role,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TaskComment {
    /// Creates a new comment
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, TaskComment>(
            r#"
            INSERT INTO task_comments (task_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, content, created_at, updated_at, deleted_at
            "#,
        )
        .bind(task_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Finds a non-deleted comment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, TaskComment>(
            r#"
            SELECT id, task_id, author_id, content, created_at, updated_at, deleted_at
            FROM task_comments
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Lists a task's non-deleted comments with authors, oldest first
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CommentAuthorRow>(
            r#"
            SELECT c.id, c.task_id, c.content,
                   u.id AS author_id, u.name AS author_name,
                   u.email AS author_email, u.role AS author_role,
                   c.created_at, c.updated_at
            FROM task_comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.task_id = $1 AND c.deleted_at IS NULL
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }

    /// Updates a comment's content
    ///
    /// Returns the updated comment, or None if no non-deleted comment
    /// matches.
    pub async fn update_content(
        pool: &PgPool,
        id: Uuid,
        content: String,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, TaskComment>(
            r#"
            UPDATE task_comments
            SET content = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, task_id, author_id, content, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Soft-deletes a comment
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE task_comments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
