//! Directory user entity (database row mapping).

use domain::models::{Role, UserContext};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for organization roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRoleDb {
    Admin,
    Manager,
    User,
}

impl From<UserRoleDb> for Role {
    fn from(role: UserRoleDb) -> Self {
        match role {
            UserRoleDb::Admin => Role::Admin,
            UserRoleDb::Manager => Role::Manager,
            UserRoleDb::User => Role::User,
        }
    }
}

impl From<Role> for UserRoleDb {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => UserRoleDb::Admin,
            Role::Manager => UserRoleDb::Manager,
            Role::User => UserRoleDb::User,
        }
    }
}

/// A user joined with their organization name.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub organization_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRoleDb,
}

impl From<UserEntity> for UserContext {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            organization_id: entity.organization_id,
            organization_name: entity.organization_name,
            role: entity.role.into(),
            email: entity.email,
            first_name: entity.first_name,
            last_name: entity.last_name,
            phone: entity.phone,
        }
    }
}
