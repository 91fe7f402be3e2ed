//! Queue of pending requests the caller may decide.
//!
//! Inventory managers see every pending request of the organization. Other
//! users only see shareable requests for groups where they hold an
//! acknowledged share and nothing else is free, since the only thing they
//! can do is pass their own share on.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::approved_item::ApproveRequest;
use domain::models::requested_item::{ListRequestsQuery, RequestedItemView};
use domain::models::{ApprovedItem, ItemType, RequestedItem, UserContext};
use domain::services::{LendingError, Notification};
use persistence::repositories::{LendingRepository, RequestFilter, RequestedItemRepository};
use shared::pagination::PageWindow;
use tracing::info;
use uuid::Uuid;

use super::requests::find_one;
use super::Page;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::email::dispatch;

/// A request in the caller's queue, or NotFound.
async fn find_manageable(
    state: &AppState,
    ctx: &UserContext,
    request_id: Uuid,
) -> Result<RequestedItemView, ApiError> {
    let view = find_one(state, request_id, &RequestFilter::organization(ctx.organization_id)).await?;
    if ctx.manages_inventory() {
        return Ok(view);
    }

    let can_pass_share = view.item_type == ItemType::Shareable
        && RequestedItemRepository::new(state.pool.clone())
            .can_pass_share_in_group(ctx.id, view.item_group_id)
            .await?;
    if !can_pass_share {
        return Err(LendingError::NotFound("request").into());
    }
    Ok(view)
}

/// Reads the optional approve payload. Only an empty body stands for "no
/// duration"; anything else must be a valid payload.
fn approve_payload(body: &[u8]) -> Result<ApproveRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApproveRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e), Vec::new()))
}

/// GET /api/v1/manage-requests
pub async fn list_manageable_requests(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Page<RequestedItemView>>, ApiError> {
    let window = PageWindow::new(query.page, query.per_page);
    let shares_only = !ctx.manages_inventory();

    let repo = RequestedItemRepository::new(state.pool.clone());
    let rows = repo
        .list_manageable(
            ctx.organization_id,
            ctx.id,
            shares_only,
            window.limit(),
            window.offset(),
        )
        .await?;
    let total = repo
        .count_manageable(ctx.organization_id, ctx.id, shares_only)
        .await?;

    Ok(Json(Page {
        data: rows.into_iter().map(Into::into).collect(),
        pagination: window.meta(total),
    }))
}

/// GET /api/v1/manage-requests/:request_id
pub async fn get_manageable_request(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestedItemView>, ApiError> {
    Ok(Json(find_manageable(&state, &ctx, request_id).await?))
}

/// Turn a pending request down.
///
/// DELETE /api/v1/manage-requests/:request_id
pub async fn reject_request(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestedItem>, ApiError> {
    let request = LendingRepository::new(state.pool.clone())
        .reject_request(&ctx, request_id)
        .await?;

    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        request_id = %request.id,
        "Request rejected"
    );
    Ok(Json(request))
}

/// Approve a pending request with a concrete item.
///
/// POST /api/v1/manage-requests/:request_id/items/:item_id/approve
///
/// The holder is emailed after the transaction commits; a failed email
/// never undoes the approval.
pub async fn approve_request(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((request_id, item_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApprovedItem>), ApiError> {
    let approved_duration = approve_payload(&body)?.approved_duration;

    let receipt = LendingRepository::new(state.pool.clone())
        .approve(&ctx, request_id, item_id, approved_duration)
        .await?;

    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        request_id = %request_id,
        approved_id = %receipt.approval.id,
        item_id = %receipt.item.id,
        remaining = receipt.item.quantity,
        reclaimed_id = ?receipt.reclaimed.as_ref().map(|r| r.id),
        "Request approved"
    );

    dispatch(
        state.notifier.clone(),
        Notification::request_approved(
            &ctx,
            &receipt.holder_email,
            &receipt.item_group_name,
            receipt.quantity,
        ),
    );

    Ok((StatusCode::CREATED, Json(receipt.approval)))
}
