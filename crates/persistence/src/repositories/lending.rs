//! Transactional lending store.
//!
//! Each operation loads and row-locks what it touches, hands owned values to
//! the domain engine, and writes back the engine's result in the same
//! transaction. Locks are always taken in the order request, item, grant.
//! A refusal or database error drops the transaction, leaving no mutation.

use chrono::Utc;
use domain::models::requested_item::CreateRequestRequest;
use domain::models::{
    ApprovedItem, Item, ItemGroup, NewApprovedItem, RequestedItem, StatusChange, UserContext,
};
use domain::services::{self, ApprovalCandidate, HeldShare, LendingError};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::item_history;
use super::requested_item::CAN_PASS_SHARE_IN_GROUP;
use crate::entities::{
    ApprovalStatusDb, ApprovedItemEntity, HeldShareEntity, ItemEntity, ItemGroupEntity, ItemTypeDb,
    RequestStatusDb, RequestedItemEntity,
};
use crate::error::LendingStoreError;
use crate::metrics::{record_lending_refusal, record_lending_transition, QueryTimer};

/// A committed approval with what the holder needs to be told.
#[derive(Debug, Clone)]
pub struct ApprovalReceipt {
    pub approval: ApprovedItem,
    pub reclaimed: Option<ApprovedItem>,
    pub item: Item,
    pub item_group_name: String,
    pub quantity: i32,
    pub holder_email: String,
}

/// Repository running the lending state machine.
#[derive(Clone)]
pub struct LendingRepository {
    pool: PgPool,
}

impl LendingRepository {
    /// Creates a new LendingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Files a borrowing request against an item group.
    pub async fn create_request(
        &self,
        ctx: &UserContext,
        item_group_id: Uuid,
        payload: CreateRequestRequest,
    ) -> Result<RequestedItem, LendingStoreError> {
        let timer = QueryTimer::new("create_request");
        let mut conn = self.pool.acquire().await?;

        let group = find_group(&mut conn, item_group_id).await?;
        let new = refusal(
            "create_request",
            services::submit_request(ctx, &group, payload, Utc::now()),
        )?;

        let entity = sqlx::query_as::<_, RequestedItemEntity>(
            r#"
            INSERT INTO requested_items
                (item_group_id, requested_by, item_type, quantity, requested_duration,
                 status, current_status_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, item_group_id, requested_by, item_type, quantity, requested_duration,
                      status, current_status_date, created_at, updated_at
            "#,
        )
        .bind(new.item_group_id)
        .bind(new.requested_by)
        .bind(ItemTypeDb::from(new.item_type))
        .bind(new.quantity)
        .bind(new.requested_duration)
        .bind(RequestStatusDb::from(new.status))
        .bind(new.current_status_date)
        .fetch_one(&mut *conn)
        .await?;
        timer.record();

        record_lending_transition("create_request");
        Ok(entity.into())
    }

    /// Approves a pending request with a concrete item.
    ///
    /// If the approver holds the item as an acknowledged shareable grant, that
    /// grant is returned in the same transaction before the new one is made.
    pub async fn approve(
        &self,
        approver: &UserContext,
        request_id: Uuid,
        item_id: Uuid,
        approved_duration: Option<i32>,
    ) -> Result<ApprovalReceipt, LendingStoreError> {
        let timer = QueryTimer::new("approve_request");
        let mut tx = self.pool.begin().await?;

        let request = lock_request(&mut tx, request_id).await?;
        let request_group = find_group(&mut tx, request.item_group_id).await?;
        let item = lock_item(&mut tx, item_id).await?;
        let item_group = if item.item_group_id == request_group.id {
            request_group.clone()
        } else {
            find_group(&mut tx, item.item_group_id).await?
        };
        let held_share = lock_held_share(&mut tx, approver.id, item_id).await?;

        let now = Utc::now();
        let outcome = refusal(
            "approve",
            services::approve(
                approver,
                ApprovalCandidate {
                    request,
                    request_group: request_group.clone(),
                    item,
                    item_group,
                    held_share,
                },
                approved_duration,
                now,
            ),
        )?;

        if let Some(reclaimed) = &outcome.reclaimed {
            save_approval(&mut tx, reclaimed).await?;
            item_history::record(&mut tx, StatusChange::from(reclaimed)).await;
        }
        save_item(&mut tx, &outcome.item).await?;
        save_request(&mut tx, &outcome.request).await?;

        let approval: ApprovedItem = insert_approval(&mut tx, &outcome.grant).await?.into();
        item_history::record(&mut tx, StatusChange::from(&approval)).await;

        let holder_email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = $1")
            .bind(approval.approved_to)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();

        record_lending_transition("approve");
        if outcome.reclaimed.is_some() {
            record_lending_transition("reclaim");
        }

        Ok(ApprovalReceipt {
            approval,
            reclaimed: outcome.reclaimed,
            item: outcome.item,
            item_group_name: request_group.name,
            quantity: outcome.request.quantity,
            holder_email,
        })
    }

    /// Changes the duration of a grant.
    pub async fn update_approval(
        &self,
        ctx: &UserContext,
        approved_id: Uuid,
        approved_duration: Option<i32>,
    ) -> Result<ApprovedItem, LendingStoreError> {
        let timer = QueryTimer::new("update_approval");
        let mut tx = self.pool.begin().await?;

        let approval = lock_approval(&mut tx, approved_id).await?;
        let item = find_item(&mut tx, approval.item_id).await?;
        let group = find_group(&mut tx, item.item_group_id).await?;

        let approval = refusal(
            "update_approval",
            services::update_duration(ctx, approval, &item, &group, approved_duration),
        )?;

        let saved: ApprovedItem = save_approval(&mut tx, &approval).await?.into();
        item_history::record(&mut tx, StatusChange::from(&saved)).await;

        tx.commit().await?;
        timer.record();

        record_lending_transition("update_approval");
        Ok(saved)
    }

    /// Confirms receipt of a grant by its holder.
    pub async fn acknowledge(
        &self,
        holder: &UserContext,
        approved_id: Uuid,
    ) -> Result<ApprovedItem, LendingStoreError> {
        let timer = QueryTimer::new("acknowledge_approval");
        let mut tx = self.pool.begin().await?;

        let approval = lock_approval(&mut tx, approved_id).await?;
        let approval = refusal(
            "acknowledge",
            services::acknowledge(holder, approval, Utc::now()),
        )?;

        let saved: ApprovedItem = save_approval(&mut tx, &approval).await?.into();
        item_history::record(&mut tx, StatusChange::from(&saved)).await;

        tx.commit().await?;
        timer.record();

        record_lending_transition("acknowledge");
        Ok(saved)
    }

    /// Returns a grant and puts its quantity back into the inventory.
    pub async fn return_item(
        &self,
        holder: &UserContext,
        approved_id: Uuid,
    ) -> Result<ApprovedItem, LendingStoreError> {
        let timer = QueryTimer::new("return_approval");
        let mut tx = self.pool.begin().await?;

        let item_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT item_id FROM approved_items WHERE id = $1 AND trashed = FALSE",
        )
        .bind(approved_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LendingError::NotFound("approved item"))?;

        let item = lock_item(&mut tx, item_id).await?;
        let approval = lock_approval(&mut tx, approved_id).await?;
        let group = find_group(&mut tx, item.item_group_id).await?;
        let quantity = request_quantity(&mut tx, approval.request_id).await?;

        let outcome = refusal(
            "return",
            services::return_item(holder, approval, item, &group, quantity, Utc::now()),
        )?;

        save_item(&mut tx, &outcome.item).await?;
        let saved: ApprovedItem = save_approval(&mut tx, &outcome.approval).await?.into();
        item_history::record(&mut tx, StatusChange::from(&saved)).await;

        tx.commit().await?;
        timer.record();

        record_lending_transition("return");
        Ok(saved)
    }

    /// Withdraws the caller's own pending request.
    pub async fn cancel_request(
        &self,
        requester: &UserContext,
        request_id: Uuid,
    ) -> Result<RequestedItem, LendingStoreError> {
        let timer = QueryTimer::new("cancel_request");
        let mut tx = self.pool.begin().await?;

        let request = lock_request(&mut tx, request_id).await?;
        let request = refusal(
            "cancel_request",
            services::cancel_request(requester, request, Utc::now()),
        )?;
        let saved = save_request(&mut tx, &request).await?;

        tx.commit().await?;
        timer.record();

        record_lending_transition("cancel_request");
        Ok(saved.into())
    }

    /// Turns down a pending request.
    pub async fn reject_request(
        &self,
        approver: &UserContext,
        request_id: Uuid,
    ) -> Result<RequestedItem, LendingStoreError> {
        let timer = QueryTimer::new("reject_request");
        let mut tx = self.pool.begin().await?;

        let request = lock_request(&mut tx, request_id).await?;
        let group = find_group(&mut tx, request.item_group_id).await?;
        let can_pass_share = !approver.manages_inventory()
            && can_pass_share_in_group(&mut tx, approver.id, group.id).await?;

        let request = refusal(
            "reject_request",
            services::reject_request(approver, request, &group, can_pass_share, Utc::now()),
        )?;
        let saved = save_request(&mut tx, &request).await?;

        tx.commit().await?;
        timer.record();

        record_lending_transition("reject_request");
        Ok(saved.into())
    }
}

/// Counts an engine refusal before handing it back.
fn refusal<T>(transition: &'static str, result: Result<T, LendingError>) -> Result<T, LendingError> {
    if let Err(e) = &result {
        record_lending_refusal(transition, e.code());
        tracing::debug!(transition, code = e.code(), "Lending transition refused");
    }
    result
}

async fn find_group(conn: &mut PgConnection, id: Uuid) -> Result<ItemGroup, LendingStoreError> {
    let entity = sqlx::query_as::<_, ItemGroupEntity>(
        r#"
        SELECT id, name, organization_id, added_by, is_accessory, created_at, updated_at
        FROM item_groups
        WHERE id = $1 AND trashed = FALSE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LendingError::NotFound("item group"))?;
    Ok(entity.into())
}

async fn lock_request(conn: &mut PgConnection, id: Uuid) -> Result<RequestedItem, LendingStoreError> {
    let entity = sqlx::query_as::<_, RequestedItemEntity>(
        r#"
        SELECT id, item_group_id, requested_by, item_type, quantity, requested_duration,
               status, current_status_date, created_at, updated_at
        FROM requested_items
        WHERE id = $1 AND trashed = FALSE
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LendingError::NotFound("request"))?;
    Ok(entity.into())
}

async fn request_quantity(conn: &mut PgConnection, request_id: Uuid) -> Result<i32, LendingStoreError> {
    let quantity = sqlx::query_scalar::<_, i32>("SELECT quantity FROM requested_items WHERE id = $1")
        .bind(request_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(LendingError::NotFound("request"))?;
    Ok(quantity)
}

async fn find_item(conn: &mut PgConnection, id: Uuid) -> Result<Item, LendingStoreError> {
    let entity = sqlx::query_as::<_, ItemEntity>(
        r#"
        SELECT id, item_group_id, quantity, item_type, is_assigned, created_at, updated_at
        FROM items
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LendingError::NotFound("item"))?;
    Ok(entity.into())
}

async fn lock_item(conn: &mut PgConnection, id: Uuid) -> Result<Item, LendingStoreError> {
    let entity = sqlx::query_as::<_, ItemEntity>(
        r#"
        SELECT id, item_group_id, quantity, item_type, is_assigned, created_at, updated_at
        FROM items
        WHERE id = $1 AND trashed = FALSE
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LendingError::NotFound("item"))?;
    Ok(entity.into())
}

async fn lock_approval(conn: &mut PgConnection, id: Uuid) -> Result<ApprovedItem, LendingStoreError> {
    let entity = sqlx::query_as::<_, ApprovedItemEntity>(
        r#"
        SELECT id, request_id, approved_by, approved_to, item_id, approved_duration,
               status, current_status_date, created_at, updated_at
        FROM approved_items
        WHERE id = $1 AND trashed = FALSE
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LendingError::NotFound("approved item"))?;
    Ok(entity.into())
}

async fn lock_held_share(
    conn: &mut PgConnection,
    approver_id: Uuid,
    item_id: Uuid,
) -> Result<Option<HeldShare>, sqlx::Error> {
    let entity = sqlx::query_as::<_, HeldShareEntity>(
        r#"
        SELECT a.id, a.request_id, a.approved_by, a.approved_to, a.item_id, a.approved_duration,
               a.status, a.current_status_date, a.created_at, a.updated_at, r.quantity
        FROM approved_items a
        JOIN requested_items r ON r.id = a.request_id
        WHERE a.approved_to = $1
          AND a.item_id = $2
          AND a.status = 'acknowledged'
          AND a.trashed = FALSE
        ORDER BY a.created_at DESC
        LIMIT 1
        FOR UPDATE OF a
        "#,
    )
    .bind(approver_id)
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(entity.map(|held| HeldShare {
        approval: held.approval.into(),
        quantity: held.quantity,
    }))
}

async fn can_pass_share_in_group(
    conn: &mut PgConnection,
    user_id: Uuid,
    group_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(CAN_PASS_SHARE_IN_GROUP)
        .bind(user_id)
        .bind(group_id)
        .fetch_one(&mut *conn)
        .await
}

async fn save_item(conn: &mut PgConnection, item: &Item) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE items
        SET quantity = $2, is_assigned = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(item.id)
    .bind(item.quantity)
    .bind(item.is_assigned)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn save_request(
    conn: &mut PgConnection,
    request: &RequestedItem,
) -> Result<RequestedItemEntity, sqlx::Error> {
    sqlx::query_as::<_, RequestedItemEntity>(
        r#"
        UPDATE requested_items
        SET status = $2, current_status_date = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, item_group_id, requested_by, item_type, quantity, requested_duration,
                  status, current_status_date, created_at, updated_at
        "#,
    )
    .bind(request.id)
    .bind(RequestStatusDb::from(request.status))
    .bind(request.current_status_date)
    .fetch_one(&mut *conn)
    .await
}

async fn save_approval(
    conn: &mut PgConnection,
    approval: &ApprovedItem,
) -> Result<ApprovedItemEntity, sqlx::Error> {
    sqlx::query_as::<_, ApprovedItemEntity>(
        r#"
        UPDATE approved_items
        SET status = $2, current_status_date = $3, approved_duration = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING id, request_id, approved_by, approved_to, item_id, approved_duration,
                  status, current_status_date, created_at, updated_at
        "#,
    )
    .bind(approval.id)
    .bind(ApprovalStatusDb::from(approval.status))
    .bind(approval.current_status_date)
    .bind(approval.approved_duration)
    .fetch_one(&mut *conn)
    .await
}

async fn insert_approval(
    conn: &mut PgConnection,
    grant: &NewApprovedItem,
) -> Result<ApprovedItemEntity, sqlx::Error> {
    sqlx::query_as::<_, ApprovedItemEntity>(
        r#"
        INSERT INTO approved_items
            (request_id, approved_by, approved_to, item_id, approved_duration,
             status, current_status_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, request_id, approved_by, approved_to, item_id, approved_duration,
                  status, current_status_date, created_at, updated_at
        "#,
    )
    .bind(grant.request_id)
    .bind(grant.approved_by)
    .bind(grant.approved_to)
    .bind(grant.item_id)
    .bind(grant.approved_duration)
    .bind(ApprovalStatusDb::from(grant.status))
    .bind(grant.current_status_date)
    .fetch_one(&mut *conn)
    .await
}
