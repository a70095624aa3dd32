/// Database models for Taskhub
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts with global roles (admin, manager, developer)
/// - `project`: Projects owned by a manager
/// - `project_member`: Per-project membership roster with roles
/// - `task`: Tasks belonging to a project
/// - `task_comment`: Comments on tasks
/// - `attachment`: File attachments with a single polymorphic parent
///
/// All models except `project_member` are soft-deletable: a `deleted_at`
/// timestamp hides the row from normal reads without destroying it.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::user::{CreateUser, User, UserRole};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Manager,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod attachment;
pub mod project;
pub mod project_member;
pub mod task;
pub mod task_comment;
pub mod user;
