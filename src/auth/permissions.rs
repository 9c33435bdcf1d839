//! Permission levels for route authorization

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::BookwormError;

/// Permission levels, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum PermissionLevel {
    /// No session - catalog browsing only
    #[default]
    Public = 0,
    /// Logged-in reader - quizzes, reviews, reading list
    Authenticated = 1,
    /// Administrator - catalog and quiz management
    Admin = 2,
}

impl PermissionLevel {
    /// Permission level granted to a user account
    pub fn for_user(is_admin: bool) -> Self {
        if is_admin {
            PermissionLevel::Admin
        } else {
            PermissionLevel::Authenticated
        }
    }

    /// Fail with `Forbidden` unless this level reaches `required`
    pub fn require(self, required: PermissionLevel) -> Result<(), BookwormError> {
        if self >= required {
            Ok(())
        } else {
            Err(BookwormError::Forbidden(format!(
                "{} permission required",
                required
            )))
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionLevel::Public => write!(f, "PUBLIC"),
            PermissionLevel::Authenticated => write!(f, "AUTHENTICATED"),
            PermissionLevel::Admin => write!(f, "ADMIN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_ordering() {
        assert!(PermissionLevel::Admin > PermissionLevel::Authenticated);
        assert!(PermissionLevel::Authenticated > PermissionLevel::Public);
    }

    #[test]
    fn test_require() {
        assert!(PermissionLevel::Admin.require(PermissionLevel::Admin).is_ok());
        assert!(PermissionLevel::Admin
            .require(PermissionLevel::Authenticated)
            .is_ok());
        assert!(matches!(
            PermissionLevel::Authenticated.require(PermissionLevel::Admin),
            Err(BookwormError::Forbidden(_))
        ));
    }

    #[test]
    fn test_for_user() {
        assert_eq!(PermissionLevel::for_user(true), PermissionLevel::Admin);
        assert_eq!(
            PermissionLevel::for_user(false),
            PermissionLevel::Authenticated
        );
    }
}
