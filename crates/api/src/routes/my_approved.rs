//! Grants held by the caller.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::approved_item::{ApprovedItemView, ListApprovalsQuery};
use domain::models::{ApprovalStats, ApprovedItem, StatsScope};
use persistence::repositories::{ApprovalFilter, LendingRepository};
use shared::pagination::PageWindow;
use tracing::info;
use uuid::Uuid;

use super::approvals::{filtered, find_one, list_page};
use super::{stats_approvals, Page};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// GET /api/v1/my-approved
pub async fn list_my_approved(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListApprovalsQuery>,
) -> Result<Json<Page<ApprovedItemView>>, ApiError> {
    let filter = filtered(
        ApprovalFilter::approved_to(ctx.organization_id, ctx.id),
        &query,
    );
    let window = PageWindow::new(query.page, query.per_page);
    Ok(Json(list_page(&state, &filter, window).await?))
}

/// GET /api/v1/my-approved/stats
pub async fn my_approved_stats(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApprovalStats>, ApiError> {
    Ok(Json(stats_approvals(&state, &ctx, StatsScope::Mine).await?))
}

/// GET /api/v1/my-approved/:approved_id
pub async fn get_my_approved(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(approved_id): Path<Uuid>,
) -> Result<Json<ApprovedItemView>, ApiError> {
    let filter = ApprovalFilter::approved_to(ctx.organization_id, ctx.id);
    Ok(Json(find_one(&state, approved_id, &filter).await?))
}

/// Confirm receipt of a grant.
///
/// POST /api/v1/my-approved/:approved_id/acknowledge
pub async fn acknowledge(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(approved_id): Path<Uuid>,
) -> Result<Json<ApprovedItem>, ApiError> {
    let approval = LendingRepository::new(state.pool.clone())
        .acknowledge(&ctx, approved_id)
        .await?;

    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        approved_id = %approval.id,
        "Approval acknowledged"
    );
    Ok(Json(approval))
}

/// Give a grant back.
///
/// POST /api/v1/my-approved/:approved_id/return
pub async fn return_item(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(approved_id): Path<Uuid>,
) -> Result<Json<ApprovedItem>, ApiError> {
    let approval = LendingRepository::new(state.pool.clone())
        .return_item(&ctx, approved_id)
        .await?;

    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        approved_id = %approval.id,
        item_id = %approval.item_id,
        "Approval returned"
    );
    Ok(Json(approval))
}
