/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login endpoint
/// - `users`: User account management
/// - `projects`: Project CRUD with membership seeding and roster replace
/// - `members`: Explicit roster add/update/remove operations
/// - `tasks`: Task CRUD, membership-scoped
/// - `comments`: Task comments
/// - `attachments`: File attachments with polymorphic parents
///
/// Every mutating handler for a non-admin principal runs the role gate and
/// the scope gate (see `taskhub_shared::access`) before touching storage.

pub mod attachments;
pub mod auth;
pub mod comments;
pub mod health;
pub mod members;
pub mod projects;
pub mod tasks;
pub mod users;
