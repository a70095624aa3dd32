//! # Taskhub Shared Library
//!
//! This crate contains shared types, database models, and the authorization
//! core used by the Taskhub API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `access`: Membership-scoped authorization (the policy core)
//! - `auth`: Authentication utilities (JWT, passwords, middleware)
//! - `db`: Connection pool and migration management
//! - `storage`: Attachment file store

pub mod access;
pub mod auth;
pub mod db;
pub mod models;
pub mod storage;

/// Current version of the Taskhub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
