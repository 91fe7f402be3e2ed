//! Item endpoint handlers.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::item::{CreateItemRequest, ItemDetail, ListItemsQuery, UpdateItemRequest};
use domain::models::item_history::{ItemHistoryQuery, ItemHistoryView};
use domain::models::{Item, ItemAttribute};
use domain::services::{catalog, LendingError};
use persistence::entities::ItemTypeDb;
use persistence::repositories::{ItemFilter, ItemHistoryRepository, ItemRepository};
use shared::pagination::PageWindow;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{load_group, load_item, Page};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

async fn with_attributes(
    repo: &ItemRepository,
    items: Vec<Item>,
) -> Result<Vec<ItemDetail>, ApiError> {
    let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
    let mut by_item: HashMap<Uuid, Vec<ItemAttribute>> = HashMap::new();
    for attribute in repo.attributes_for(&ids).await? {
        let attribute: ItemAttribute = attribute.into();
        by_item.entry(attribute.item_id).or_default().push(attribute);
    }

    Ok(items
        .into_iter()
        .map(|item| ItemDetail {
            attributes: by_item.remove(&item.id).unwrap_or_default(),
            item,
        })
        .collect())
}

/// List the items of a group.
///
/// GET /api/v1/item-groups/:group_id/items
pub async fn list_items(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<Page<ItemDetail>>, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let window = PageWindow::new(query.page, query.per_page);
    let filter = ItemFilter {
        item_type: query.item_type.map(ItemTypeDb::from),
        is_assigned: query.is_assigned,
    };

    let repo = ItemRepository::new(state.pool.clone());
    let items: Vec<Item> = repo
        .list_for_group(group.id, &filter, window.limit(), window.offset())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = repo.count_for_group(group.id, &filter).await?;

    Ok(Json(Page {
        data: with_attributes(&repo, items).await?,
        pagination: window.meta(total),
    }))
}

/// Items of a group the caller can lend onward: their acknowledged shares.
///
/// GET /api/v1/item-groups/:group_id/items/lendable
pub async fn list_lendable_items(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<ItemDetail>>, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let repo = ItemRepository::new(state.pool.clone());
    let items: Vec<Item> = repo
        .list_lendable(ctx.id, group.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(with_attributes(&repo, items).await?))
}

/// Add an item to a group.
///
/// POST /api/v1/item-groups/:group_id/items
pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemDetail>), ApiError> {
    request.validate()?;
    let group = load_group(&state, &ctx, group_id).await?;
    let new_item = catalog::new_item(&ctx, &group, request)?;

    let (item, attributes) = ItemRepository::new(state.pool.clone())
        .create(&new_item)
        .await?;
    let detail = ItemDetail {
        item: item.into(),
        attributes: attributes.into_iter().map(Into::into).collect(),
    };

    info!(
        org_id = %ctx.organization_id,
        item_group_id = %group.id,
        item_id = %detail.item.id,
        item_type = %detail.item.item_type,
        quantity = detail.item.quantity,
        "Item created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get one item with its attributes.
///
/// GET /api/v1/item-groups/:group_id/items/:item_id
pub async fn get_item(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((group_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ItemDetail>, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let item = load_item(&state, &group, item_id).await?;

    let repo = ItemRepository::new(state.pool.clone());
    let mut details = with_attributes(&repo, vec![item]).await?;
    details
        .pop()
        .map(Json)
        .ok_or_else(|| LendingError::NotFound("item").into())
}

/// Update an item's quantity or attributes.
///
/// PUT /api/v1/item-groups/:group_id/items/:item_id
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((group_id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<ItemDetail>, ApiError> {
    request.validate()?;
    let group = load_group(&state, &ctx, group_id).await?;
    let item = load_item(&state, &group, item_id).await?;
    let item = catalog::update_item(&ctx, &group, item, &request)?;

    let repo = ItemRepository::new(state.pool.clone());
    let saved: Item = repo
        .update(&item, request.attributes.as_deref())
        .await?
        .ok_or(LendingError::NotFound("item"))?
        .into();

    info!(org_id = %ctx.organization_id, item_id = %saved.id, "Item updated");
    let mut details = with_attributes(&repo, vec![saved]).await?;
    details
        .pop()
        .map(Json)
        .ok_or_else(|| LendingError::NotFound("item").into())
}

/// Soft-delete an item.
///
/// DELETE /api/v1/item-groups/:group_id/items/:item_id
pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((group_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let item = load_item(&state, &group, item_id).await?;
    catalog::ensure_item_deletable(&ctx, &group, &item)?;

    if !ItemRepository::new(state.pool.clone())
        .soft_delete(item.id)
        .await?
    {
        return Err(LendingError::NotFound("item").into());
    }

    info!(org_id = %ctx.organization_id, item_id = %item.id, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Status history of an item's grants, newest first. Open to every member of
/// the item's organization.
///
/// GET /api/v1/item-groups/:group_id/items/:item_id/history
pub async fn item_history(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((group_id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ItemHistoryQuery>,
) -> Result<Json<Page<ItemHistoryView>>, ApiError> {
    let group = load_group(&state, &ctx, group_id).await?;
    let item = load_item(&state, &group, item_id).await?;

    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(ApiError::Validation(
                "start_date must not be after end_date".to_string(),
                Vec::new(),
            ));
        }
    }

    let window = PageWindow::new(query.page, query.per_page);
    let repo = ItemHistoryRepository::new(state.pool.clone());
    let rows = repo
        .list_for_item(
            item.id,
            query.start_date,
            query.end_date,
            window.limit(),
            window.offset(),
        )
        .await?;
    let total = repo
        .count_for_item(item.id, query.start_date, query.end_date)
        .await?;

    Ok(Json(Page {
        data: rows.into_iter().map(Into::into).collect(),
        pagination: window.meta(total),
    }))
}
