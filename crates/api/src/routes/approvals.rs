//! Grants the caller has given.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::approved_item::{ApprovedItemView, ListApprovalsQuery};
use domain::models::{ApprovalStats, StatsScope};
use domain::services::LendingError;
use persistence::entities::{ApprovalStatusDb, ItemTypeDb};
use persistence::repositories::{ApprovalFilter, ApprovedItemRepository};
use shared::pagination::PageWindow;
use uuid::Uuid;

use super::{search_term, stats_approvals, Page};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Narrows `base` with the listing query's filters.
pub(crate) fn filtered(base: ApprovalFilter, query: &ListApprovalsQuery) -> ApprovalFilter {
    ApprovalFilter {
        item_type: query.item_type.map(ItemTypeDb::from),
        status: query.status.map(ApprovalStatusDb::from),
        search: search_term(query.search.clone()),
        ..base
    }
}

pub(crate) async fn list_page(
    state: &AppState,
    filter: &ApprovalFilter,
    window: PageWindow,
) -> Result<Page<ApprovedItemView>, ApiError> {
    let repo = ApprovedItemRepository::new(state.pool.clone());
    let rows = repo.list(filter, window.limit(), window.offset()).await?;
    let total = repo.count(filter).await?;
    Ok(Page {
        data: repo.attach_attributes(rows).await?,
        pagination: window.meta(total),
    })
}

pub(crate) async fn find_one(
    state: &AppState,
    approved_id: Uuid,
    filter: &ApprovalFilter,
) -> Result<ApprovedItemView, ApiError> {
    let repo = ApprovedItemRepository::new(state.pool.clone());
    let row = repo
        .find_view(approved_id, filter)
        .await?
        .ok_or(LendingError::NotFound("approved item"))?;
    repo.attach_attributes(vec![row])
        .await?
        .pop()
        .ok_or_else(|| LendingError::NotFound("approved item").into())
}

/// GET /api/v1/approvals
pub async fn list_given_approvals(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListApprovalsQuery>,
) -> Result<Json<Page<ApprovedItemView>>, ApiError> {
    let filter = filtered(
        ApprovalFilter::approved_by(ctx.organization_id, ctx.id),
        &query,
    );
    let window = PageWindow::new(query.page, query.per_page);
    Ok(Json(list_page(&state, &filter, window).await?))
}

/// GET /api/v1/approvals/stats
pub async fn given_approval_stats(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApprovalStats>, ApiError> {
    Ok(Json(
        stats_approvals(&state, &ctx, StatsScope::GrantedByMe).await?,
    ))
}

/// GET /api/v1/approvals/:approved_id
pub async fn get_given_approval(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(approved_id): Path<Uuid>,
) -> Result<Json<ApprovedItemView>, ApiError> {
    let filter = ApprovalFilter::approved_by(ctx.organization_id, ctx.id);
    Ok(Json(find_one(&state, approved_id, &filter).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{ApprovalStatus, ItemType};

    #[test]
    fn test_filtered_keeps_scope() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let query = ListApprovalsQuery {
            item_type: Some(ItemType::Returnable),
            status: Some(ApprovalStatus::Acknowledged),
            search: Some(" drill ".to_string()),
            ..Default::default()
        };

        let filter = filtered(ApprovalFilter::approved_to(org, user), &query);

        assert_eq!(filter.organization_id, org);
        assert_eq!(filter.approved_to, Some(user));
        assert_eq!(filter.approved_by, None);
        assert_eq!(filter.item_type, Some(ItemTypeDb::Returnable));
        assert_eq!(filter.status, Some(ApprovalStatusDb::Acknowledged));
        assert_eq!(filter.search.as_deref(), Some("drill"));
    }
}
