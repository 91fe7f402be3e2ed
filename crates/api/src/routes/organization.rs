//! Organization-wide views for inventory managers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::approved_item::{ApprovedItemView, ListApprovalsQuery, UpdateApprovalRequest};
use domain::models::requested_item::{ListRequestsQuery, RequestedItemView};
use domain::models::{
    ApprovalStats, ApprovedItem, RequestStats, StatsScope, UserContext,
};
use domain::services::{
    reminder_for, require_inventory_manager, LendingError, Notification, NotificationTemplate,
};
use persistence::entities::{ItemTypeDb, RequestStatusDb};
use persistence::repositories::{
    ApprovalFilter, ApprovedItemRepository, LendingRepository, RequestFilter, UserRepository,
};
use serde::Serialize;
use shared::pagination::PageWindow;
use tracing::{info, warn};
use uuid::Uuid;

use super::approvals::{filtered, list_page as list_approval_page};
use super::requests::list_page as list_request_page;
use super::{search_term, stats_approvals, stats_requests, Page};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::email::dispatch;

/// Outcome of a reminder request.
#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub approved_id: Uuid,
    /// Template queued for the holder. Absent when the grant needs no reminder.
    pub template: Option<NotificationTemplate>,
}

fn organization_requests(ctx: &UserContext, query: &ListRequestsQuery) -> RequestFilter {
    RequestFilter {
        item_type: query.item_type.map(ItemTypeDb::from),
        status: query.status.map(RequestStatusDb::from),
        search: search_term(query.search.clone()),
        ..RequestFilter::organization(ctx.organization_id)
    }
}

/// GET /api/v1/organization/requests
pub async fn list_organization_requests(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Page<RequestedItemView>>, ApiError> {
    require_inventory_manager(&ctx)?;

    let filter = organization_requests(&ctx, &query);
    let window = PageWindow::new(query.page, query.per_page);
    Ok(Json(list_request_page(&state, &filter, window).await?))
}

/// GET /api/v1/organization/requests/stats
pub async fn organization_request_stats(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<RequestStats>, ApiError> {
    Ok(Json(
        stats_requests(&state, &ctx, StatsScope::Organization).await?,
    ))
}

/// GET /api/v1/organization/approved
pub async fn list_organization_approved(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListApprovalsQuery>,
) -> Result<Json<Page<ApprovedItemView>>, ApiError> {
    require_inventory_manager(&ctx)?;

    let filter = filtered(ApprovalFilter::organization(ctx.organization_id), &query);
    let window = PageWindow::new(query.page, query.per_page);
    Ok(Json(list_approval_page(&state, &filter, window).await?))
}

/// GET /api/v1/organization/approved/stats
pub async fn organization_approved_stats(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApprovalStats>, ApiError> {
    Ok(Json(
        stats_approvals(&state, &ctx, StatsScope::Organization).await?,
    ))
}

/// Change how long a grant may be kept.
///
/// PATCH /api/v1/organization/approved/:approved_id
pub async fn update_approval(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(approved_id): Path<Uuid>,
    Json(request): Json<UpdateApprovalRequest>,
) -> Result<Json<ApprovedItem>, ApiError> {
    let approval = LendingRepository::new(state.pool.clone())
        .update_approval(&ctx, approved_id, request.approved_duration)
        .await?;

    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        approved_id = %approval.id,
        approved_duration = ?approval.approved_duration,
        "Approval duration updated"
    );
    Ok(Json(approval))
}

/// Nudge the holder of a grant.
///
/// POST /api/v1/organization/approved/:approved_id/reminder
pub async fn send_reminder(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(approved_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReminderResponse>), ApiError> {
    require_inventory_manager(&ctx)?;

    let approval: ApprovedItem = ApprovedItemRepository::new(state.pool.clone())
        .find_in_org(approved_id, ctx.organization_id)
        .await?
        .ok_or(LendingError::NotFound("approved item"))?
        .into();

    let Some(template) = reminder_for(&approval) else {
        return Ok((
            StatusCode::OK,
            Json(ReminderResponse {
                approved_id,
                template: None,
            }),
        ));
    };

    let Some(holder) = UserRepository::new(state.pool.clone())
        .find_active(approval.approved_to)
        .await?
    else {
        warn!(
            approved_id = %approved_id,
            user_id = %approval.approved_to,
            "Holder is no longer active; reminder skipped"
        );
        return Ok((
            StatusCode::OK,
            Json(ReminderResponse {
                approved_id,
                template: None,
            }),
        ));
    };

    dispatch(
        state.notifier.clone(),
        Notification::reminder(template, &holder.email, &holder.first_name, 1),
    );

    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        approved_id = %approved_id,
        template = %template,
        "Reminder queued"
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(ReminderResponse {
            approved_id,
            template: Some(template),
        }),
    ))
}
