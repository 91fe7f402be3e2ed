//! Read-only access to the organization/user directory.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for directory lookups.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Loads an active user together with their organization.
    pub async fn find_active(&self, user_id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT u.id, u.organization_id, o.name AS organization_name, u.email,
                   u.first_name, u.last_name, u.phone, u.role
            FROM users u
            JOIN organizations o ON o.id = u.organization_id
            WHERE u.id = $1 AND u.is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
