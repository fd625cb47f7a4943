//! User and role models

use serde::{Deserialize, Serialize};

/// Role of a user account
///
/// Staff can read everything and record stock movements. Deleting records
/// and managing user accounts is reserved for admins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "staff" => Some(UserRole::Staff),
            _ => None,
        }
    }

    pub fn can_delete(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse(" Staff "), Some(UserRole::Staff));
        assert_eq!(UserRole::parse("owner"), None);
    }

    #[test]
    fn test_only_admin_deletes() {
        assert!(UserRole::Admin.can_delete());
        assert!(!UserRole::Staff.can_delete());
        assert!(!UserRole::Staff.can_manage_users());
    }
}
