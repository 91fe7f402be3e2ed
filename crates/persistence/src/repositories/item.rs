//! Item repository for database operations.

use domain::models::item::AttributeInput;
use domain::models::{Item, NewItem};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{ItemAttributeEntity, ItemEntity, ItemTypeDb};
use crate::metrics::QueryTimer;

/// Filters for item listings.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub item_type: Option<ItemTypeDb>,
    pub is_assigned: Option<bool>,
}

/// Repository for item and item attribute database operations.
#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    /// Creates a new ItemRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates an item with its attributes.
    pub async fn create(
        &self,
        item: &NewItem,
    ) -> Result<(ItemEntity, Vec<ItemAttributeEntity>), sqlx::Error> {
        let timer = QueryTimer::new("create_item");
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, ItemEntity>(
            r#"
            INSERT INTO items (item_group_id, quantity, item_type)
            VALUES ($1, $2, $3)
            RETURNING id, item_group_id, quantity, item_type, is_assigned, created_at, updated_at
            "#,
        )
        .bind(item.item_group_id)
        .bind(item.quantity)
        .bind(ItemTypeDb::from(item.item_type))
        .fetch_one(&mut *tx)
        .await?;

        let attributes = insert_attributes(&mut *tx, entity.id, &item.attributes).await?;

        tx.commit().await?;
        timer.record();
        Ok((entity, attributes))
    }

    /// Find a non-trashed item of a group.
    pub async fn find_in_group(
        &self,
        group_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<ItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_item_in_group");
        let result = sqlx::query_as::<_, ItemEntity>(
            r#"
            SELECT id, item_group_id, quantity, item_type, is_assigned, created_at, updated_at
            FROM items
            WHERE id = $1 AND item_group_id = $2 AND trashed = FALSE
            "#,
        )
        .bind(item_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List the items of a group.
    pub async fn list_for_group(
        &self,
        group_id: Uuid,
        filter: &ItemFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_items_for_group");
        let result = sqlx::query_as::<_, ItemEntity>(
            r#"
            SELECT id, item_group_id, quantity, item_type, is_assigned, created_at, updated_at
            FROM items
            WHERE item_group_id = $1
              AND trashed = FALSE
              AND ($2::item_type IS NULL OR item_type = $2)
              AND ($3::boolean IS NULL OR is_assigned = $3)
            ORDER BY created_at ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(group_id)
        .bind(filter.item_type)
        .bind(filter.is_assigned)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count the items of a group matching the filter.
    pub async fn count_for_group(
        &self,
        group_id: Uuid,
        filter: &ItemFilter,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_items_for_group");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM items
            WHERE item_group_id = $1
              AND trashed = FALSE
              AND ($2::item_type IS NULL OR item_type = $2)
              AND ($3::boolean IS NULL OR is_assigned = $3)
            "#,
        )
        .bind(group_id)
        .bind(filter.item_type)
        .bind(filter.is_assigned)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Items of a group the user holds as an acknowledged shareable grant.
    ///
    /// These are the items the user can pass on to another requester.
    pub async fn list_lendable(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<Vec<ItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_lendable_items");
        let result = sqlx::query_as::<_, ItemEntity>(
            r#"
            SELECT DISTINCT i.id, i.item_group_id, i.quantity, i.item_type, i.is_assigned,
                   i.created_at, i.updated_at
            FROM items i
            JOIN approved_items a ON a.item_id = i.id
            WHERE i.item_group_id = $2
              AND i.trashed = FALSE
              AND i.item_type = 'shareable'
              AND a.approved_to = $1
              AND a.status = 'acknowledged'
              AND a.trashed = FALSE
            ORDER BY i.created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Attributes of the given items.
    pub async fn attributes_for(
        &self,
        item_ids: &[Uuid],
    ) -> Result<Vec<ItemAttributeEntity>, sqlx::Error> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("list_item_attributes");
        let result = sqlx::query_as::<_, ItemAttributeEntity>(
            r#"
            SELECT id, item_id, name, value
            FROM item_attributes
            WHERE item_id = ANY($1) AND trashed = FALSE
            ORDER BY created_at ASC
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Persists an updated item. `attributes`, when given, replaces the set.
    pub async fn update(
        &self,
        item: &Item,
        attributes: Option<&[AttributeInput]>,
    ) -> Result<Option<ItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_item");
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, ItemEntity>(
            r#"
            UPDATE items
            SET quantity = $2, is_assigned = $3, updated_at = NOW()
            WHERE id = $1 AND trashed = FALSE
            RETURNING id, item_group_id, quantity, item_type, is_assigned, created_at, updated_at
            "#,
        )
        .bind(item.id)
        .bind(item.quantity)
        .bind(item.is_assigned)
        .fetch_optional(&mut *tx)
        .await?;

        if let (Some(entity), Some(attributes)) = (&entity, attributes) {
            sqlx::query(
                r#"
                UPDATE item_attributes SET trashed = TRUE, updated_at = NOW()
                WHERE item_id = $1 AND trashed = FALSE
                "#,
            )
            .bind(entity.id)
            .execute(&mut *tx)
            .await?;

            insert_attributes(&mut *tx, entity.id, attributes).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Soft-deletes an item.
    pub async fn soft_delete(&self, item_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_item");
        let result = sqlx::query(
            r#"
            UPDATE items SET trashed = TRUE, updated_at = NOW()
            WHERE id = $1 AND trashed = FALSE
            "#,
        )
        .bind(item_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }
}

async fn insert_attributes(
    conn: &mut PgConnection,
    item_id: Uuid,
    attributes: &[AttributeInput],
) -> Result<Vec<ItemAttributeEntity>, sqlx::Error> {
    let mut inserted = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let entity = sqlx::query_as::<_, ItemAttributeEntity>(
            r#"
            INSERT INTO item_attributes (item_id, name, value)
            VALUES ($1, $2, $3)
            RETURNING id, item_id, name, value
            "#,
        )
        .bind(item_id)
        .bind(attribute.name.trim())
        .bind(&attribute.value)
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(entity);
    }
    Ok(inserted)
}
