//! Reader sessions and quiz verification state
//!
//! A login opens a session; the session id travels inside the JWT. Everything
//! request-scoped about the caller is carried in a [`SessionContext`], which
//! is what the quiz and review services receive instead of reaching into a
//! global table.

pub mod store;

pub use store::{spawn_cleanup_task, SessionStats, SessionStore};

use crate::auth::PermissionLevel;
use crate::types::BookwormError;

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: i64,
    pub username: String,
    pub permission_level: PermissionLevel,
}

impl SessionContext {
    pub fn is_admin(&self) -> bool {
        self.permission_level >= PermissionLevel::Admin
    }

    /// Fail with `Forbidden` unless the caller is an administrator
    pub fn require_admin(&self) -> Result<(), BookwormError> {
        self.permission_level.require(PermissionLevel::Admin)
    }

    /// Owners and administrators may modify a user's content
    pub fn require_owner_or_admin(&self, owner_id: i64) -> Result<(), BookwormError> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(BookwormError::Forbidden(
                "Only the author or an administrator may change this".into(),
            ))
        }
    }
}
