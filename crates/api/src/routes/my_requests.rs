//! The caller's own requests across all groups.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::requested_item::{ListRequestsQuery, RequestedItemView};
use domain::models::{RequestStats, RequestedItem, StatsScope};
use persistence::repositories::RequestFilter;
use shared::pagination::PageWindow;
use uuid::Uuid;

use super::requests::{cancel, find_one, list_page, own_requests};
use super::{stats_requests, Page};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// GET /api/v1/my-requests
pub async fn list_my_requests(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Page<RequestedItemView>>, ApiError> {
    let filter = own_requests(ctx.organization_id, ctx.id, None, &query);
    let window = PageWindow::new(query.page, query.per_page);
    Ok(Json(list_page(&state, &filter, window).await?))
}

/// GET /api/v1/my-requests/stats
pub async fn my_request_stats(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<RequestStats>, ApiError> {
    Ok(Json(stats_requests(&state, &ctx, StatsScope::Mine).await?))
}

/// GET /api/v1/my-requests/:request_id
pub async fn get_my_request(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestedItemView>, ApiError> {
    let filter = RequestFilter::requested_by(ctx.organization_id, ctx.id);
    Ok(Json(find_one(&state, request_id, &filter).await?))
}

/// DELETE /api/v1/my-requests/:request_id
pub async fn cancel_my_request(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestedItem>, ApiError> {
    Ok(Json(cancel(&state, &ctx, request_id).await?))
}
