//! HTTP route handlers.

pub mod approvals;
pub mod health;
pub mod item_groups;
pub mod items;
pub mod manage_requests;
pub mod my_approved;
pub mod my_requests;
pub mod organization;
pub mod requests;

use domain::models::{
    ApprovalStats, Item, ItemGroup, RequestStats, StatsScope, UserContext,
};
use domain::services::{ensure_same_org, require_inventory_manager, LendingError};
use persistence::repositories::{
    ApprovalFilter, ApprovedItemRepository, ItemGroupRepository, ItemRepository, RequestFilter,
    RequestedItemRepository,
};
use serde::Serialize;
use shared::pagination::Pagination;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Loads a live item group of the caller's organization.
pub(crate) async fn load_group(
    state: &AppState,
    ctx: &UserContext,
    group_id: Uuid,
) -> Result<ItemGroup, ApiError> {
    let group: ItemGroup = ItemGroupRepository::new(state.pool.clone())
        .find_by_id(group_id)
        .await?
        .ok_or(LendingError::NotFound("item group"))?
        .into();
    ensure_same_org(ctx, group.organization_id)?;
    Ok(group)
}

/// Loads a live item of `group`.
pub(crate) async fn load_item(
    state: &AppState,
    group: &ItemGroup,
    item_id: Uuid,
) -> Result<Item, ApiError> {
    let item = ItemRepository::new(state.pool.clone())
        .find_in_group(group.id, item_id)
        .await?
        .ok_or(LendingError::NotFound("item"))?;
    Ok(item.into())
}

/// Request counts by status in the caller's scope.
pub async fn stats_requests(
    state: &AppState,
    ctx: &UserContext,
    scope: StatsScope,
) -> Result<RequestStats, ApiError> {
    let filter = match scope {
        StatsScope::Mine => RequestFilter::requested_by(ctx.organization_id, ctx.id),
        StatsScope::GrantedByMe => RequestFilter::approved_by(ctx.organization_id, ctx.id),
        StatsScope::Organization => {
            require_inventory_manager(ctx)?;
            RequestFilter::organization(ctx.organization_id)
        }
    };
    let rows = RequestedItemRepository::new(state.pool.clone())
        .count_by_status(&filter)
        .await?;
    Ok(RequestStats::from_counts(
        rows.into_iter().map(|row| (row.status.into(), row.count)),
    ))
}

/// Grant counts by status in the caller's scope.
pub async fn stats_approvals(
    state: &AppState,
    ctx: &UserContext,
    scope: StatsScope,
) -> Result<ApprovalStats, ApiError> {
    let filter = match scope {
        StatsScope::Mine => ApprovalFilter::approved_to(ctx.organization_id, ctx.id),
        StatsScope::GrantedByMe => ApprovalFilter::approved_by(ctx.organization_id, ctx.id),
        StatsScope::Organization => {
            require_inventory_manager(ctx)?;
            ApprovalFilter::organization(ctx.organization_id)
        }
    };
    let rows = ApprovedItemRepository::new(state.pool.clone())
        .count_by_status(&filter)
        .await?;
    Ok(ApprovalStats::from_counts(
        rows.into_iter().map(|row| (row.status.into(), row.count)),
    ))
}

/// Trims a search term, treating blank input as absent.
pub(crate) fn search_term(search: Option<String>) -> Option<String> {
    search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
