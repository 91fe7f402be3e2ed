//! Requested item repository: read side of borrowing requests.
//!
//! Writes go through [`super::LendingRepository`].

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ItemTypeDb, RequestStatusCountEntity, RequestStatusDb, RequestedItemViewEntity};
use crate::metrics::QueryTimer;

/// Scope and filters for request listings. Always bound to one organization.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    pub organization_id: Uuid,
    pub requested_by: Option<Uuid>,
    /// Only requests this user approved.
    pub approved_by: Option<Uuid>,
    pub item_group_id: Option<Uuid>,
    pub item_type: Option<ItemTypeDb>,
    pub status: Option<RequestStatusDb>,
    pub search: Option<String>,
}

impl RequestFilter {
    pub fn organization(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            requested_by: None,
            approved_by: None,
            item_group_id: None,
            item_type: None,
            status: None,
            search: None,
        }
    }

    pub fn requested_by(organization_id: Uuid, user_id: Uuid) -> Self {
        Self {
            requested_by: Some(user_id),
            ..Self::organization(organization_id)
        }
    }

    pub fn approved_by(organization_id: Uuid, user_id: Uuid) -> Self {
        Self {
            approved_by: Some(user_id),
            ..Self::organization(organization_id)
        }
    }
}

/// `$1` user, `$2` item group. Shared with the transactional reject path.
pub(crate) const CAN_PASS_SHARE_IN_GROUP: &str = r#"
    SELECT EXISTS (
        SELECT 1
        FROM approved_items a
        JOIN items i ON i.id = a.item_id
        WHERE a.approved_to = $1
          AND a.status = 'acknowledged'
          AND a.trashed = FALSE
          AND i.item_group_id = $2
          AND i.item_type = 'shareable'
    )
    AND NOT EXISTS (
        SELECT 1
        FROM items free
        WHERE free.item_group_id = $2
          AND free.trashed = FALSE
          AND free.is_assigned = FALSE
    )
"#;

/// Repository for request reads.
#[derive(Clone)]
pub struct RequestedItemRepository {
    pool: PgPool,
}

impl RequestedItemRepository {
    /// Creates a new RequestedItemRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find one request within the filter's scope.
    pub async fn find_view(
        &self,
        request_id: Uuid,
        filter: &RequestFilter,
    ) -> Result<Option<RequestedItemViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_request_view");
        let result = sqlx::query_as::<_, RequestedItemViewEntity>(
            r#"
            SELECT r.id, r.item_group_id, ig.name AS item_group_name, r.item_type, r.quantity,
                   r.requested_duration, r.status, r.requested_by,
                   TRIM(u.first_name || ' ' || u.last_name) AS requested_by_name,
                   r.current_status_date, r.created_at, r.updated_at
            FROM requested_items r
            JOIN item_groups ig ON ig.id = r.item_group_id
            JOIN users u ON u.id = r.requested_by
            WHERE r.id = $1
              AND r.trashed = FALSE
              AND ig.organization_id = $2
              AND ($3::uuid IS NULL OR r.requested_by = $3)
              AND ($4::uuid IS NULL OR r.item_group_id = $4)
            "#,
        )
        .bind(request_id)
        .bind(filter.organization_id)
        .bind(filter.requested_by)
        .bind(filter.item_group_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List requests, newest first.
    pub async fn list(
        &self,
        filter: &RequestFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RequestedItemViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_requests");
        let result = sqlx::query_as::<_, RequestedItemViewEntity>(
            r#"
            SELECT r.id, r.item_group_id, ig.name AS item_group_name, r.item_type, r.quantity,
                   r.requested_duration, r.status, r.requested_by,
                   TRIM(u.first_name || ' ' || u.last_name) AS requested_by_name,
                   r.current_status_date, r.created_at, r.updated_at
            FROM requested_items r
            JOIN item_groups ig ON ig.id = r.item_group_id
            JOIN users u ON u.id = r.requested_by
            WHERE r.trashed = FALSE
              AND ig.organization_id = $1
              AND ($2::uuid IS NULL OR r.requested_by = $2)
              AND ($3::uuid IS NULL OR r.item_group_id = $3)
              AND ($9::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM approved_items a WHERE a.request_id = r.id AND a.approved_by = $9
              ))
              AND ($4::item_type IS NULL OR r.item_type = $4)
              AND ($5::request_status IS NULL OR r.status = $5)
              AND ($6::text IS NULL OR ig.name ILIKE '%' || $6 || '%')
            ORDER BY r.created_at DESC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.requested_by)
        .bind(filter.item_group_id)
        .bind(filter.item_type)
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .bind(limit)
        .bind(offset)
        .bind(filter.approved_by)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count requests matching the filter.
    pub async fn count(&self, filter: &RequestFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_requests");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM requested_items r
            JOIN item_groups ig ON ig.id = r.item_group_id
            WHERE r.trashed = FALSE
              AND ig.organization_id = $1
              AND ($2::uuid IS NULL OR r.requested_by = $2)
              AND ($3::uuid IS NULL OR r.item_group_id = $3)
              AND ($7::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM approved_items a WHERE a.request_id = r.id AND a.approved_by = $7
              ))
              AND ($4::item_type IS NULL OR r.item_type = $4)
              AND ($5::request_status IS NULL OR r.status = $5)
              AND ($6::text IS NULL OR ig.name ILIKE '%' || $6 || '%')
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.requested_by)
        .bind(filter.item_group_id)
        .bind(filter.item_type)
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .bind(filter.approved_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Request counts by status within the filter's scope.
    pub async fn count_by_status(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<RequestStatusCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("count_requests_by_status");
        let result = sqlx::query_as::<_, RequestStatusCountEntity>(
            r#"
            SELECT r.status, COUNT(*) AS count
            FROM requested_items r
            JOIN item_groups ig ON ig.id = r.item_group_id
            WHERE r.trashed = FALSE
              AND ig.organization_id = $1
              AND ($2::uuid IS NULL OR r.requested_by = $2)
              AND ($3::uuid IS NULL OR r.item_group_id = $3)
              AND ($4::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM approved_items a WHERE a.request_id = r.id AND a.approved_by = $4
              ))
            GROUP BY r.status
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.requested_by)
        .bind(filter.item_group_id)
        .bind(filter.approved_by)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Pending requests the caller may decide.
    ///
    /// With `shares_only`, only shareable requests are listed, in groups where
    /// `user_id` holds an acknowledged shareable item and no item is free.
    pub async fn list_manageable(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        shares_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RequestedItemViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_manageable_requests");
        let result = sqlx::query_as::<_, RequestedItemViewEntity>(
            r#"
            SELECT r.id, r.item_group_id, ig.name AS item_group_name, r.item_type, r.quantity,
                   r.requested_duration, r.status, r.requested_by,
                   TRIM(u.first_name || ' ' || u.last_name) AS requested_by_name,
                   r.current_status_date, r.created_at, r.updated_at
            FROM requested_items r
            JOIN item_groups ig ON ig.id = r.item_group_id
            JOIN users u ON u.id = r.requested_by
            WHERE r.trashed = FALSE
              AND r.status = 'pending'
              AND ig.organization_id = $1
              AND (
                  NOT $3
                  OR (
                      r.item_type = 'shareable'
                      AND EXISTS (
                          SELECT 1
                          FROM approved_items a
                          JOIN items i ON i.id = a.item_id
                          WHERE a.approved_to = $2
                            AND a.status = 'acknowledged'
                            AND a.trashed = FALSE
                            AND i.item_group_id = r.item_group_id
                            AND i.item_type = 'shareable'
                      )
                      AND NOT EXISTS (
                          SELECT 1
                          FROM items i2
                          WHERE i2.item_group_id = r.item_group_id
                            AND i2.trashed = FALSE
                            AND i2.is_assigned = FALSE
                      )
                  )
              )
            ORDER BY r.created_at ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(shares_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count of [`Self::list_manageable`].
    pub async fn count_manageable(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        shares_only: bool,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_manageable_requests");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM requested_items r
            JOIN item_groups ig ON ig.id = r.item_group_id
            WHERE r.trashed = FALSE
              AND r.status = 'pending'
              AND ig.organization_id = $1
              AND (
                  NOT $3
                  OR (
                      r.item_type = 'shareable'
                      AND EXISTS (
                          SELECT 1
                          FROM approved_items a
                          JOIN items i ON i.id = a.item_id
                          WHERE a.approved_to = $2
                            AND a.status = 'acknowledged'
                            AND a.trashed = FALSE
                            AND i.item_group_id = r.item_group_id
                            AND i.item_type = 'shareable'
                      )
                      AND NOT EXISTS (
                          SELECT 1
                          FROM items i2
                          WHERE i2.item_group_id = r.item_group_id
                            AND i2.trashed = FALSE
                            AND i2.is_assigned = FALSE
                      )
                  )
              )
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(shares_only)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// True if the user may pass a share of the group on: they hold an
    /// acknowledged shareable item of it and no item of the group is free.
    pub async fn can_pass_share_in_group(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("can_pass_share_in_group");
        let result = sqlx::query_scalar::<_, bool>(CAN_PASS_SHARE_IN_GROUP)
            .bind(user_id)
            .bind(group_id)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }
}
