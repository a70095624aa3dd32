/// Membership-scoped authorization
///
/// This module is the policy core of Taskhub. Every handler composes the
/// same two checks, in order:
///
/// 1. **Role gate**: a static check of the principal's global role against
///    the roles an operation requires (`gate::require_role`).
/// 2. **Scope gate**: for non-admin principals, the resource's project must
///    be in the set of projects the principal manages or is a member of
///    (`gate::require_project_access`, or [`scope::ProjectScope`] as a query
///    restriction for list operations).
///
/// Admin principals pass the scope gate unconditionally and never consult
/// the membership index. There is no cache: every decision is recomputed
/// from current storage, per request.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::access::gate;
/// use taskhub_shared::auth::middleware::Principal;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// async fn can_delete_task(
///     pool: &PgPool,
///     principal: &Principal,
///     project_id: Uuid,
/// ) -> Result<(), gate::AccessError> {
///     gate::require_role(principal, gate::TASK_WRITE_ROLES)?;
///     gate::require_project_access(pool, principal, project_id).await?;
///     Ok(())
/// }
/// ```

pub mod gate;
pub mod scope;
