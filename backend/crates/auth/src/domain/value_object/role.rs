//! User Role Value Object
//!
//! Closed role set. Roles are compared as enum values; free-form role
//! strings are parsed exactly once at the boundary (case-insensitive),
//! so role-name drift cannot pass a guard silently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform roles, stored as small integer ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Owner,
    Staff,
    Customer,
}

impl Role {
    /// Stable storage id
    pub fn code(self) -> i16 {
        match self {
            Role::Admin => 1,
            Role::Owner => 2,
            Role::Staff => 3,
            Role::Customer => 4,
        }
    }

    /// Resolve a storage id back to a role
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Role::Admin),
            2 => Some(Role::Owner),
            3 => Some(Role::Staff),
            4 => Some(Role::Customer),
            _ => None,
        }
    }

    /// Parse a role name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "OWNER" => Some(Role::Owner),
            "STAFF" => Some(Role::Staff),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
            Role::Staff => "STAFF",
            Role::Customer => "CUSTOMER",
        }
    }

    /// Admin accounts require a verified second factor
    pub fn requires_strong_auth(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" STAFF "), Some(Role::Staff));
        assert_eq!(Role::parse("customer"), Some(Role::Customer));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_code_roundtrip() {
        for role in [Role::Admin, Role::Owner, Role::Staff, Role::Customer] {
            assert_eq!(Role::from_code(role.code()), Some(role));
        }
        assert_eq!(Role::from_code(99), None);
    }

    #[test]
    fn test_strong_auth_requirement() {
        assert!(Role::Admin.requires_strong_auth());
        assert!(!Role::Owner.requires_strong_auth());
        assert!(!Role::Staff.requires_strong_auth());
        assert!(!Role::Customer.requires_strong_auth());
    }
}
