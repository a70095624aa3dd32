/// Attachment model with polymorphic ownership
///
/// An attachment hangs off exactly one parent: a project, a task, or a task
/// comment. The three foreign keys are mutually exclusive; [`AttachmentParent`]
/// is the only way to express a parent in this crate, so a row with zero or
/// multiple parents cannot be constructed through this module. The database
/// carries the same invariant as a CHECK constraint.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attachments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     filename VARCHAR(255) NOT NULL,
///     mime_type VARCHAR(255) NOT NULL,
///     size BIGINT NOT NULL,
///     path VARCHAR(512) NOT NULL,
///     url VARCHAR(512) NOT NULL,
///     project_id UUID REFERENCES projects(id),
///     task_id UUID REFERENCES tasks(id),
///     task_comment_id UUID REFERENCES task_comments(id),
///     uploaded_by_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ,
///     CHECK (num_nonnulls(project_id, task_id, task_comment_id) = 1)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// The single parent of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum AttachmentParent {
    /// Attached directly to a project
    Project(Uuid),

    /// Attached to a task
    Task(Uuid),

    /// Attached to a task comment
    Comment(Uuid),
}

/// Error constructing an attachment parent from raw references
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParentRefError {
    /// None of the three references were set
    #[error("Attachment requires a parent: one of project_id, task_id or task_comment_id")]
    Missing,

    /// More than one reference was set
    #[error("Attachment must have exactly one parent, got {0}")]
    Ambiguous(usize),
}

impl AttachmentParent {
    /// Builds a parent from the three optional references, enforcing the
    /// exactly-one invariant
    pub fn from_refs(
        project_id: Option<Uuid>,
        task_id: Option<Uuid>,
        task_comment_id: Option<Uuid>,
    ) -> Result<Self, ParentRefError> {
        match (project_id, task_id, task_comment_id) {
            (None, None, None) => Err(ParentRefError::Missing),
            (Some(id), None, None) => Ok(AttachmentParent::Project(id)),
            (None, Some(id), None) => Ok(AttachmentParent::Task(id)),
            (None, None, Some(id)) => Ok(AttachmentParent::Comment(id)),
            (p, t, c) => {
                let set = [p.is_some(), t.is_some(), c.is_some()]
                    .into_iter()
                    .filter(|s| *s)
                    .count();
                Err(ParentRefError::Ambiguous(set))
            }
        }
    }

    /// Splits the parent back into the three column values
    pub fn as_refs(&self) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
        match *self {
            AttachmentParent::Project(id) => (Some(id), None, None),
            AttachmentParent::Task(id) => (None, Some(id), None),
            AttachmentParent::Comment(id) => (None, None, Some(id)),
        }
    }

    /// Resolves the project this parent lives under, for scope checks
    ///
    /// Returns None when the referenced parent row does not exist (or is
    /// soft-deleted); callers surface that as NotFound before any write.
    pub async fn resolve_project_id(
        &self,
        pool: &PgPool,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let project_id: Option<Uuid> = match *self {
            AttachmentParent::Project(id) => {
                sqlx::query_scalar(
                    "SELECT id FROM projects WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
            AttachmentParent::Task(id) => {
                sqlx::query_scalar(
                    "SELECT project_id FROM tasks WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
            AttachmentParent::Comment(id) => {
                sqlx::query_scalar(
                    r#"
                    SELECT t.project_id
                    FROM task_comments c
                    JOIN tasks t ON t.id = c.task_id
                    WHERE c.id = $1 AND c.deleted_at IS NULL AND t.deleted_at IS NULL
                    "#,
                )
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(project_id)
    }
}

/// Attachment metadata row
///
/// The row is the authoritative resource; the stored file is secondary and
/// its deletion is best-effort.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    /// Unique attachment ID
    pub id: Uuid,

    /// Original (sanitized) filename
    pub filename: String,

    /// MIME type as validated at upload
    pub mime_type: String,

    /// Size in bytes
    pub size: i64,

    /// Storage path relative to the upload root
    pub path: String,

    /// Public URL
    pub url: String,

    /// Parent project, when attached to a project
    pub project_id: Option<Uuid>,

    /// Parent task, when attached to a task
    pub task_id: Option<Uuid>,

    /// Parent comment, when attached to a comment
    pub task_comment_id: Option<Uuid>,

    /// Uploading user
    pub uploaded_by_id: Uuid,

    /// When the attachment was created
    pub created_at: DateTime<Utc>,

    /// When the attachment was last updated
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating an attachment row
#[derive(Debug, Clone)]
pub struct CreateAttachment {
    /// Sanitized filename
    pub filename: String,

    /// Validated MIME type
    pub mime_type: String,

    /// Size in bytes
    pub size: i64,

    /// Storage path relative to the upload root
    pub path: String,

    /// Public URL
    pub url: String,

    /// The single parent
    pub parent: AttachmentParent,

    /// Uploading user
    pub uploaded_by_id: Uuid,
}

impl Attachment {
    /// Creates an attachment row
    ///
    /// The parent access check and the file write both happen before this.
    pub async fn create(pool: &PgPool, data: CreateAttachment) -> Result<Self, sqlx::Error> {
        let (project_id, task_id, task_comment_id) = data.parent.as_refs();

        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments
                (filename, mime_type, size, path, url,
                 project_id, task_id, task_comment_id, uploaded_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, filename, mime_type, size, path, url,
                      project_id, task_id, task_comment_id, uploaded_by_id,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.filename)
        .bind(data.mime_type)
        .bind(data.size)
        .bind(data.path)
        .bind(data.url)
        .bind(project_id)
        .bind(task_id)
        .bind(task_comment_id)
        .bind(data.uploaded_by_id)
        .fetch_one(pool)
        .await?;

        Ok(attachment)
    }

    /// Finds a non-deleted attachment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, filename, mime_type, size, path, url,
                   project_id, task_id, task_comment_id, uploaded_by_id,
                   created_at, updated_at, deleted_at
            FROM attachments
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(attachment)
    }

    /// The attachment's parent, reconstructed from the row
    ///
    /// The exactly-one invariant is guaranteed by the CHECK constraint; a
    /// row that somehow violates it surfaces as an error rather than a
    /// silent pick.
    pub fn parent(&self) -> Result<AttachmentParent, ParentRefError> {
        AttachmentParent::from_refs(self.project_id, self.task_id, self.task_comment_id)
    }

    /// Soft-deletes an attachment row
    ///
    /// File cleanup is the caller's concern and is best-effort; the row is
    /// the authoritative resource.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE attachments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
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
    fn test_parent_exactly_one() {
        let id = Uuid::new_v4();

        assert_eq!(
            AttachmentParent::from_refs(Some(id), None, None),
            Ok(AttachmentParent::Project(id))
        );
        assert_eq!(
            AttachmentParent::from_refs(None, Some(id), None),
            Ok(AttachmentParent::Task(id))
        );
        assert_eq!(
            AttachmentParent::from_refs(None, None, Some(id)),
            Ok(AttachmentParent::Comment(id))
        );
    }

    #[test]
    fn test_parent_zero_refs_rejected() {
        assert_eq!(
            AttachmentParent::from_refs(None, None, None),
            Err(ParentRefError::Missing)
        );
    }

    #[test]
    fn test_parent_multiple_refs_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(
            AttachmentParent::from_refs(Some(a), Some(b), None),
            Err(ParentRefError::Ambiguous(2))
        );
        assert_eq!(
            AttachmentParent::from_refs(Some(a), Some(b), Some(a)),
            Err(ParentRefError::Ambiguous(3))
        );
    }

    #[test]
    fn test_parent_roundtrip_refs() {
        let id = Uuid::new_v4();
        let parent = AttachmentParent::Task(id);
        let (p, t, c) = parent.as_refs();

        assert_eq!(AttachmentParent::from_refs(p, t, c), Ok(parent));
    }
}
