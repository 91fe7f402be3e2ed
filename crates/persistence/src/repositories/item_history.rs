//! Item history repository.
//!
//! Entries are appended by [`record`] from inside the lending transactions.
//! Listings deliberately include trashed grants: the trail outlives them.

use chrono::NaiveDate;
use domain::models::StatusChange;
use sqlx::{Connection, PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{ApprovalStatusDb, ItemHistoryEntity, ItemHistoryViewEntity};
use crate::metrics::QueryTimer;

/// Repository for item history reads.
#[derive(Clone)]
pub struct ItemHistoryRepository {
    pool: PgPool,
}

impl ItemHistoryRepository {
    /// Creates a new ItemHistoryRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// History of an item, newest first, optionally bounded by recording day.
    pub async fn list_for_item(
        &self,
        item_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ItemHistoryViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_item_history");
        let result = sqlx::query_as::<_, ItemHistoryViewEntity>(
            r#"
            SELECT h.id, a.id AS approved_id, h.status, h.created_at,
                   i.id AS item_id, i.item_group_id, ig.name AS item_group_name, i.item_type,
                   r.quantity, r.requested_duration, a.approved_duration,
                   r.created_at AS requested_at, a.created_at AS approved_at,
                   ub.id AS approved_by_id,
                   TRIM(ub.first_name || ' ' || ub.last_name) AS approved_by_name,
                   ub.email AS approved_by_email, ub.role AS approved_by_role,
                   ut.id AS approved_to_id,
                   TRIM(ut.first_name || ' ' || ut.last_name) AS approved_to_name,
                   ut.email AS approved_to_email, ut.role AS approved_to_role
            FROM item_history h
            JOIN approved_items a ON a.id = h.approved_id
            JOIN requested_items r ON r.id = a.request_id
            JOIN items i ON i.id = a.item_id
            JOIN item_groups ig ON ig.id = i.item_group_id
            JOIN users ub ON ub.id = a.approved_by
            JOIN users ut ON ut.id = a.approved_to
            WHERE a.item_id = $1
              AND h.trashed = FALSE
              AND ($2::date IS NULL OR h.created_at::date >= $2)
              AND ($3::date IS NULL OR h.created_at::date <= $3)
            ORDER BY h.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(item_id)
        .bind(start_date)
        .bind(end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count of [`Self::list_for_item`].
    pub async fn count_for_item(
        &self,
        item_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_item_history");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM item_history h
            JOIN approved_items a ON a.id = h.approved_id
            WHERE a.item_id = $1
              AND h.trashed = FALSE
              AND ($2::date IS NULL OR h.created_at::date >= $2)
              AND ($3::date IS NULL OR h.created_at::date <= $3)
            "#,
        )
        .bind(item_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Every entry recorded for one grant, oldest first.
    pub async fn list_for_approval(
        &self,
        approved_id: Uuid,
    ) -> Result<Vec<ItemHistoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_history_for_approval");
        let result = sqlx::query_as::<_, ItemHistoryEntity>(
            r#"
            SELECT id, approved_id, status, created_at
            FROM item_history
            WHERE approved_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(approved_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

/// Appends a history entry inside a savepoint of the caller's transaction.
///
/// A failure rolls back the savepoint only and is logged; the surrounding
/// transition still commits.
pub async fn record(conn: &mut PgConnection, change: StatusChange) {
    let timer = QueryTimer::new("record_item_history");
    let result: Result<(), sqlx::Error> = async {
        let mut savepoint = conn.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO item_history (approved_id, status)
            VALUES ($1, $2)
            "#,
        )
        .bind(change.approved_id)
        .bind(ApprovalStatusDb::from(change.status))
        .execute(&mut *savepoint)
        .await?;
        savepoint.commit().await
    }
    .await;
    timer.record();

    if let Err(e) = result {
        tracing::warn!(
            approved_id = %change.approved_id,
            status = %change.status,
            error = %e,
            "Failed to record item history"
        );
    }
}
