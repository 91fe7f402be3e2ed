//! Directory users as seen by the lending core.
//!
//! Users and organizations are owned by the identity side of the system. The
//! lending core only reads them to authorize transitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Organization role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    /// Admins and managers run the inventory and decide any request.
    pub fn manages_inventory(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated caller of a lending operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserContext {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub organization_name: String,
    pub role: Role,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserContext {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Returns true if a phone number is on file.
    pub fn has_phone(&self) -> bool {
        self.phone
            .as_deref()
            .map(|phone| !phone.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn manages_inventory(&self) -> bool {
        self.role.manages_inventory()
    }
}

/// Brief user info embedded in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserInfo {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::User] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert_eq!("MANAGER".parse::<Role>().unwrap(), Role::Manager);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_manages_inventory() {
        assert!(Role::Admin.manages_inventory());
        assert!(Role::Manager.manages_inventory());
        assert!(!Role::User.manages_inventory());
    }

    #[test]
    fn test_has_phone() {
        let mut ctx = fixtures::context(Uuid::new_v4(), Role::User);
        assert!(ctx.has_phone());

        ctx.phone = Some("   ".to_string());
        assert!(!ctx.has_phone());

        ctx.phone = None;
        assert!(!ctx.has_phone());
    }

    #[test]
    fn test_full_name() {
        let mut ctx = fixtures::context(Uuid::new_v4(), Role::User);
        ctx.first_name = "Ada".to_string();
        ctx.last_name = "Lovelace".to_string();
        assert_eq!(ctx.full_name(), "Ada Lovelace");

        ctx.last_name = String::new();
        assert_eq!(ctx.full_name(), "Ada");
    }
}
