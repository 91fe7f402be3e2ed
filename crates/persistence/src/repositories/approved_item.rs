//! Approved item repository: read side of grants and reminder digests.
//!
//! Writes go through [`super::LendingRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use domain::models::approved_item::ApprovedItemView;
use domain::models::ItemAttribute;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    ApprovalStatusCountEntity, ApprovalStatusDb, ApprovedItemEntity, ApprovedItemViewEntity,
    ItemAttributeEntity, ItemTypeDb, ReminderDigestEntity,
};
use crate::metrics::QueryTimer;

/// Scope and filters for grant listings. Always bound to one organization.
#[derive(Debug, Clone)]
pub struct ApprovalFilter {
    pub organization_id: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_to: Option<Uuid>,
    pub item_type: Option<ItemTypeDb>,
    pub status: Option<ApprovalStatusDb>,
    pub search: Option<String>,
}

impl ApprovalFilter {
    pub fn organization(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            approved_by: None,
            approved_to: None,
            item_type: None,
            status: None,
            search: None,
        }
    }

    pub fn approved_by(organization_id: Uuid, user_id: Uuid) -> Self {
        Self {
            approved_by: Some(user_id),
            ..Self::organization(organization_id)
        }
    }

    pub fn approved_to(organization_id: Uuid, user_id: Uuid) -> Self {
        Self {
            approved_to: Some(user_id),
            ..Self::organization(organization_id)
        }
    }
}

/// Repository for grant reads.
#[derive(Clone)]
pub struct ApprovedItemRepository {
    pool: PgPool,
}

impl ApprovedItemRepository {
    /// Creates a new ApprovedItemRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find a grant of an organization.
    pub async fn find_in_org(
        &self,
        approved_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<ApprovedItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_approval_in_org");
        let result = sqlx::query_as::<_, ApprovedItemEntity>(
            r#"
            SELECT a.id, a.request_id, a.approved_by, a.approved_to, a.item_id,
                   a.approved_duration, a.status, a.current_status_date, a.created_at, a.updated_at
            FROM approved_items a
            JOIN items i ON i.id = a.item_id
            JOIN item_groups ig ON ig.id = i.item_group_id
            WHERE a.id = $1 AND a.trashed = FALSE AND ig.organization_id = $2
            "#,
        )
        .bind(approved_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find one grant within the filter's scope.
    pub async fn find_view(
        &self,
        approved_id: Uuid,
        filter: &ApprovalFilter,
    ) -> Result<Option<ApprovedItemViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_approval_view");
        let result = sqlx::query_as::<_, ApprovedItemViewEntity>(
            r#"
            SELECT a.id, a.request_id, a.item_id, i.item_group_id, ig.name AS item_group_name,
                   i.item_type, r.quantity, a.approved_duration, a.status, a.approved_by,
                   TRIM(ub.first_name || ' ' || ub.last_name) AS approved_by_name,
                   a.approved_to, TRIM(ut.first_name || ' ' || ut.last_name) AS approved_to_name,
                   a.current_status_date, a.created_at, a.updated_at
            FROM approved_items a
            JOIN requested_items r ON r.id = a.request_id
            JOIN items i ON i.id = a.item_id
            JOIN item_groups ig ON ig.id = i.item_group_id
            JOIN users ub ON ub.id = a.approved_by
            JOIN users ut ON ut.id = a.approved_to
            WHERE a.id = $1
              AND a.trashed = FALSE
              AND ig.organization_id = $2
              AND ($3::uuid IS NULL OR a.approved_by = $3)
              AND ($4::uuid IS NULL OR a.approved_to = $4)
            "#,
        )
        .bind(approved_id)
        .bind(filter.organization_id)
        .bind(filter.approved_by)
        .bind(filter.approved_to)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List grants, newest first.
    pub async fn list(
        &self,
        filter: &ApprovalFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ApprovedItemViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_approvals");
        let result = sqlx::query_as::<_, ApprovedItemViewEntity>(
            r#"
            SELECT a.id, a.request_id, a.item_id, i.item_group_id, ig.name AS item_group_name,
                   i.item_type, r.quantity, a.approved_duration, a.status, a.approved_by,
                   TRIM(ub.first_name || ' ' || ub.last_name) AS approved_by_name,
                   a.approved_to, TRIM(ut.first_name || ' ' || ut.last_name) AS approved_to_name,
                   a.current_status_date, a.created_at, a.updated_at
            FROM approved_items a
            JOIN requested_items r ON r.id = a.request_id
            JOIN items i ON i.id = a.item_id
            JOIN item_groups ig ON ig.id = i.item_group_id
            JOIN users ub ON ub.id = a.approved_by
            JOIN users ut ON ut.id = a.approved_to
            WHERE a.trashed = FALSE
              AND ig.organization_id = $1
              AND ($2::uuid IS NULL OR a.approved_by = $2)
              AND ($3::uuid IS NULL OR a.approved_to = $3)
              AND ($4::item_type IS NULL OR i.item_type = $4)
              AND ($5::approval_status IS NULL OR a.status = $5)
              AND ($6::text IS NULL OR ig.name ILIKE '%' || $6 || '%')
            ORDER BY a.created_at DESC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.approved_by)
        .bind(filter.approved_to)
        .bind(filter.item_type)
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count grants matching the filter.
    pub async fn count(&self, filter: &ApprovalFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_approvals");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM approved_items a
            JOIN items i ON i.id = a.item_id
            JOIN item_groups ig ON ig.id = i.item_group_id
            WHERE a.trashed = FALSE
              AND ig.organization_id = $1
              AND ($2::uuid IS NULL OR a.approved_by = $2)
              AND ($3::uuid IS NULL OR a.approved_to = $3)
              AND ($4::item_type IS NULL OR i.item_type = $4)
              AND ($5::approval_status IS NULL OR a.status = $5)
              AND ($6::text IS NULL OR ig.name ILIKE '%' || $6 || '%')
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.approved_by)
        .bind(filter.approved_to)
        .bind(filter.item_type)
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Grant counts by status within the filter's scope.
    pub async fn count_by_status(
        &self,
        filter: &ApprovalFilter,
    ) -> Result<Vec<ApprovalStatusCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("count_approvals_by_status");
        let result = sqlx::query_as::<_, ApprovalStatusCountEntity>(
            r#"
            SELECT a.status, COUNT(*) AS count
            FROM approved_items a
            JOIN items i ON i.id = a.item_id
            JOIN item_groups ig ON ig.id = i.item_group_id
            WHERE a.trashed = FALSE
              AND ig.organization_id = $1
              AND ($2::uuid IS NULL OR a.approved_by = $2)
              AND ($3::uuid IS NULL OR a.approved_to = $3)
            GROUP BY a.status
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.approved_by)
        .bind(filter.approved_to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Grants not yet returned, by status, across all organizations.
    pub async fn outstanding_by_status(
        &self,
    ) -> Result<Vec<ApprovalStatusCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("count_outstanding_approvals");
        let result = sqlx::query_as::<_, ApprovalStatusCountEntity>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM approved_items
            WHERE trashed = FALSE AND status <> 'returned'
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Converts listing rows to views, attaching each item's attributes.
    pub async fn attach_attributes(
        &self,
        rows: Vec<ApprovedItemViewEntity>,
    ) -> Result<Vec<ApprovedItemView>, sqlx::Error> {
        let item_ids: Vec<Uuid> = rows.iter().map(|row| row.item_id).collect();
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("list_approval_item_attributes");
        let attributes = sqlx::query_as::<_, ItemAttributeEntity>(
            r#"
            SELECT id, item_id, name, value
            FROM item_attributes
            WHERE item_id = ANY($1) AND trashed = FALSE
            ORDER BY created_at ASC
            "#,
        )
        .bind(&item_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let mut by_item: HashMap<Uuid, Vec<ItemAttribute>> = HashMap::new();
        for attribute in attributes? {
            by_item
                .entry(attribute.item_id)
                .or_default()
                .push(attribute.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let attributes = by_item.get(&row.item_id).cloned().unwrap_or_default();
                row.into_view(attributes)
            })
            .collect())
    }

    /// Holders with grants still unacknowledged since before `created_before`.
    pub async fn pending_acknowledgement_digest(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<ReminderDigestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("pending_acknowledgement_digest");
        let result = sqlx::query_as::<_, ReminderDigestEntity>(
            r#"
            SELECT u.email, u.first_name, COUNT(*) AS count
            FROM approved_items a
            JOIN users u ON u.id = a.approved_to
            WHERE a.status = 'pending'
              AND a.trashed = FALSE
              AND a.created_at < $1
            GROUP BY u.id, u.email, u.first_name
            "#,
        )
        .bind(created_before)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Holders with acknowledged, non-permanent grants past their duration.
    pub async fn overdue_return_digest(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderDigestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("overdue_return_digest");
        let result = sqlx::query_as::<_, ReminderDigestEntity>(
            r#"
            SELECT u.email, u.first_name, COUNT(*) AS count
            FROM approved_items a
            JOIN items i ON i.id = a.item_id
            JOIN users u ON u.id = a.approved_to
            WHERE a.status = 'acknowledged'
              AND a.trashed = FALSE
              AND i.item_type <> 'permanent'
              AND a.approved_duration IS NOT NULL
              AND a.current_status_date + make_interval(days => a.approved_duration) < $1
            GROUP BY u.id, u.email, u.first_name
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
