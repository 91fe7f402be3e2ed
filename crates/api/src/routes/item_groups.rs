//! Item group endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::item_group::{
    CreateItemGroupRequest, ItemGroupSummary, ListItemGroupsQuery, UpdateItemGroupRequest,
};
use domain::models::ItemGroup;
use domain::services::{catalog, LendingError};
use persistence::repositories::{ItemGroupFilter, ItemGroupRepository};
use shared::pagination::PageWindow;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{load_group, search_term, Page};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// List item groups of the caller's organization.
///
/// GET /api/v1/item-groups
pub async fn list_item_groups(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListItemGroupsQuery>,
) -> Result<Json<Page<ItemGroupSummary>>, ApiError> {
    let window = PageWindow::new(query.page, query.per_page);
    let filter = ItemGroupFilter {
        is_accessory: query.is_accessory,
        search: search_term(query.search),
    };

    let repo = ItemGroupRepository::new(state.pool.clone());
    let rows = repo
        .list(ctx.organization_id, &filter, window.limit(), window.offset())
        .await?;
    let total = repo.count(ctx.organization_id, &filter).await?;

    Ok(Json(Page {
        data: rows.into_iter().map(Into::into).collect(),
        pagination: window.meta(total),
    }))
}

/// Create an item group.
///
/// POST /api/v1/item-groups
pub async fn create_item_group(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(request): Json<CreateItemGroupRequest>,
) -> Result<(StatusCode, Json<ItemGroup>), ApiError> {
    request.validate()?;
    let new_group = catalog::new_item_group(&ctx, request)?;

    let group: ItemGroup = ItemGroupRepository::new(state.pool.clone())
        .create(&new_group)
        .await?
        .into();

    info!(
        org_id = %ctx.organization_id,
        user_id = %ctx.id,
        item_group_id = %group.id,
        is_accessory = group.is_accessory,
        "Item group created"
    );
    Ok((StatusCode::CREATED, Json(group)))
}

/// Get one item group.
///
/// GET /api/v1/item-groups/:group_id
pub async fn get_item_group(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<ItemGroup>, ApiError> {
    Ok(Json(load_group(&state, &ctx, group_id).await?))
}

/// Rename an item group.
///
/// PUT /api/v1/item-groups/:group_id
pub async fn update_item_group(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<UpdateItemGroupRequest>,
) -> Result<Json<ItemGroup>, ApiError> {
    request.validate()?;
    let group = load_group(&state, &ctx, group_id).await?;
    let group = catalog::rename_item_group(&ctx, group, request)?;

    let saved: ItemGroup = ItemGroupRepository::new(state.pool.clone())
        .update(&group)
        .await?
        .into();

    info!(org_id = %ctx.organization_id, item_group_id = %saved.id, "Item group renamed");
    Ok(Json(saved))
}

/// Soft-delete an item group and its items.
///
/// DELETE /api/v1/item-groups/:group_id
pub async fn delete_item_group(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let repo = ItemGroupRepository::new(state.pool.clone());

    let assigned = repo.count_assigned_lendable_items(group.id).await?;
    catalog::ensure_item_group_deletable(&ctx, &group, assigned)?;

    if !repo.soft_delete(group.id).await? {
        return Err(LendingError::NotFound("item group").into());
    }

    info!(org_id = %ctx.organization_id, item_group_id = %group.id, "Item group deleted");
    Ok(StatusCode::NO_CONTENT)
}
