//! Item group repository for database operations.

use domain::models::{ItemGroup, NewItemGroup};
use domain::services::LendingError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ItemGroupEntity, ItemGroupSummaryEntity};
use crate::error::LendingStoreError;
use crate::metrics::QueryTimer;

/// Filters for item group listings.
#[derive(Debug, Clone, Default)]
pub struct ItemGroupFilter {
    pub is_accessory: Option<bool>,
    pub search: Option<String>,
}

/// Repository for item group database operations.
#[derive(Clone)]
pub struct ItemGroupRepository {
    pool: PgPool,
}

impl ItemGroupRepository {
    /// Creates a new ItemGroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates an item group. A duplicate name in the organization is refused.
    pub async fn create(&self, group: &NewItemGroup) -> Result<ItemGroupEntity, LendingStoreError> {
        let timer = QueryTimer::new("create_item_group");
        let result = sqlx::query_as::<_, ItemGroupEntity>(
            r#"
            INSERT INTO item_groups (name, organization_id, added_by, is_accessory)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, organization_id, added_by, is_accessory, created_at, updated_at
            "#,
        )
        .bind(&group.name)
        .bind(group.organization_id)
        .bind(group.added_by)
        .bind(group.is_accessory)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map_err(|e| LendingStoreError::on_unique_violation(e, LendingError::ItemGroupNameTaken))
    }

    /// Find a non-trashed item group by ID, in any organization.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ItemGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_item_group_by_id");
        let result = sqlx::query_as::<_, ItemGroupEntity>(
            r#"
            SELECT id, name, organization_id, added_by, is_accessory, created_at, updated_at
            FROM item_groups
            WHERE id = $1 AND trashed = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List an organization's item groups with item counts.
    pub async fn list(
        &self,
        organization_id: Uuid,
        filter: &ItemGroupFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ItemGroupSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_item_groups");
        let result = sqlx::query_as::<_, ItemGroupSummaryEntity>(
            r#"
            SELECT g.id, g.name, g.organization_id, g.added_by, g.is_accessory,
                   g.created_at, g.updated_at,
                   COUNT(i.id) AS item_count,
                   COUNT(i.id) FILTER (WHERE i.is_assigned = FALSE) AS available_count
            FROM item_groups g
            LEFT JOIN items i ON i.item_group_id = g.id AND i.trashed = FALSE
            WHERE g.organization_id = $1
              AND g.trashed = FALSE
              AND ($2::boolean IS NULL OR g.is_accessory = $2)
              AND ($3::text IS NULL OR g.name ILIKE '%' || $3 || '%')
            GROUP BY g.id
            ORDER BY g.name ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(organization_id)
        .bind(filter.is_accessory)
        .bind(filter.search.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count an organization's item groups matching the filter.
    pub async fn count(
        &self,
        organization_id: Uuid,
        filter: &ItemGroupFilter,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_item_groups");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM item_groups
            WHERE organization_id = $1
              AND trashed = FALSE
              AND ($2::boolean IS NULL OR is_accessory = $2)
              AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(organization_id)
        .bind(filter.is_accessory)
        .bind(filter.search.as_deref())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Persist a renamed group.
    pub async fn update(&self, group: &ItemGroup) -> Result<ItemGroupEntity, LendingStoreError> {
        let timer = QueryTimer::new("update_item_group");
        let result = sqlx::query_as::<_, ItemGroupEntity>(
            r#"
            UPDATE item_groups
            SET name = $2, updated_at = NOW()
            WHERE id = $1 AND trashed = FALSE
            RETURNING id, name, organization_id, added_by, is_accessory, created_at, updated_at
            "#,
        )
        .bind(group.id)
        .bind(&group.name)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(|e| LendingStoreError::on_unique_violation(e, LendingError::ItemGroupNameTaken))?
            .ok_or(LendingStoreError::Domain(LendingError::NotFound("item group")))
    }

    /// Number of lent-out, non-permanent items in a group.
    pub async fn count_assigned_lendable_items(&self, group_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_assigned_lendable_items");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM items
            WHERE item_group_id = $1
              AND trashed = FALSE
              AND is_assigned = TRUE
              AND item_type <> 'permanent'
            "#,
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Soft-deletes a group together with its items.
    pub async fn soft_delete(&self, group_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_item_group");
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            r#"
            UPDATE item_groups SET trashed = TRUE, updated_at = NOW()
            WHERE id = $1 AND trashed = FALSE
            "#,
        )
        .bind(group_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            UPDATE items SET trashed = TRUE, updated_at = NOW()
            WHERE item_group_id = $1 AND trashed = FALSE
            "#,
        )
        .bind(group_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(deleted > 0)
    }
}
