//! Borrowing requests scoped to one item group.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::requested_item::{
    CreateRequestRequest, ListRequestsQuery, RequestedItemView,
};
use domain::models::RequestedItem;
use domain::services::LendingError;
use persistence::entities::{ItemTypeDb, RequestStatusDb};
use persistence::repositories::{LendingRepository, RequestFilter, RequestedItemRepository};
use shared::pagination::PageWindow;
use tracing::info;
use uuid::Uuid;

use super::{load_group, search_term, Page};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Builds a listing filter over the caller's own requests.
pub(crate) fn own_requests(
    organization_id: Uuid,
    user_id: Uuid,
    item_group_id: Option<Uuid>,
    query: &ListRequestsQuery,
) -> RequestFilter {
    RequestFilter {
        item_group_id,
        item_type: query.item_type.map(ItemTypeDb::from),
        status: query.status.map(RequestStatusDb::from),
        search: search_term(query.search.clone()),
        ..RequestFilter::requested_by(organization_id, user_id)
    }
}

/// Lists `filter` one page at a time.
pub(crate) async fn list_page(
    state: &AppState,
    filter: &RequestFilter,
    window: PageWindow,
) -> Result<Page<RequestedItemView>, ApiError> {
    let repo = RequestedItemRepository::new(state.pool.clone());
    let rows = repo.list(filter, window.limit(), window.offset()).await?;
    let total = repo.count(filter).await?;
    Ok(Page {
        data: rows.into_iter().map(Into::into).collect(),
        pagination: window.meta(total),
    })
}

/// Finds one request inside `filter`.
pub(crate) async fn find_one(
    state: &AppState,
    request_id: Uuid,
    filter: &RequestFilter,
) -> Result<RequestedItemView, ApiError> {
    let view = RequestedItemRepository::new(state.pool.clone())
        .find_view(request_id, filter)
        .await?
        .ok_or(LendingError::NotFound("request"))?;
    Ok(view.into())
}

/// Withdraws one of the caller's pending requests.
pub(crate) async fn cancel(
    state: &AppState,
    ctx: &domain::models::UserContext,
    request_id: Uuid,
) -> Result<RequestedItem, ApiError> {
    let request = LendingRepository::new(state.pool.clone())
        .cancel_request(ctx, request_id)
        .await?;
    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        request_id = %request.id,
        "Request cancelled"
    );
    Ok(request)
}

/// The caller's requests in one group.
///
/// GET /api/v1/item-groups/:group_id/requests
pub async fn list_group_requests(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Page<RequestedItemView>>, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let filter = own_requests(ctx.organization_id, ctx.id, Some(group.id), &query);
    let window = PageWindow::new(query.page, query.per_page);
    Ok(Json(list_page(&state, &filter, window).await?))
}

/// File a borrowing request.
///
/// POST /api/v1/item-groups/:group_id/requests
pub async fn create_request(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<CreateRequestRequest>,
) -> Result<(StatusCode, Json<RequestedItem>), ApiError> {
    let created = LendingRepository::new(state.pool.clone())
        .create_request(&ctx, group_id, request)
        .await?;

    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        request_id = %created.id,
        item_group_id = %created.item_group_id,
        item_type = %created.item_type,
        quantity = created.quantity,
        "Request created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// One of the caller's requests in a group.
///
/// GET /api/v1/item-groups/:group_id/requests/:request_id
pub async fn get_group_request(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((group_id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RequestedItemView>, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let filter = RequestFilter {
        item_group_id: Some(group.id),
        ..RequestFilter::requested_by(ctx.organization_id, ctx.id)
    };
    Ok(Json(find_one(&state, request_id, &filter).await?))
}

/// Cancel one of the caller's requests in a group.
///
/// DELETE /api/v1/item-groups/:group_id/requests/:request_id
pub async fn cancel_group_request(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((group_id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RequestedItem>, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let filter = RequestFilter {
        item_group_id: Some(group.id),
        ..RequestFilter::requested_by(ctx.organization_id, ctx.id)
    };
    find_one(&state, request_id, &filter).await?;
    Ok(Json(cancel(&state, &ctx, request_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{ItemType, RequestStatus};

    #[test]
    fn test_own_requests_filter_maps_query() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let group = Uuid::new_v4();
        let query = ListRequestsQuery {
            item_type: Some(ItemType::Shareable),
            status: Some(RequestStatus::Pending),
            search: Some("  ".to_string()),
            ..Default::default()
        };

        let filter = own_requests(org, user, Some(group), &query);

        assert_eq!(filter.organization_id, org);
        assert_eq!(filter.requested_by, Some(user));
        assert_eq!(filter.item_group_id, Some(group));
        assert_eq!(filter.item_type, Some(ItemTypeDb::Shareable));
        assert_eq!(filter.status, Some(RequestStatusDb::Pending));
        assert_eq!(filter.search, None);
        assert_eq!(filter.approved_by, None);
    }
}
