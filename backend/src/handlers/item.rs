//! Item master data handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::item::{CreateItemInput, Item, ItemDetail, UpdateItemInput};
use crate::services::{ItemService, SearchQuery};
use crate::AppState;

pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<PaginatedResponse<Item>>> {
    let items = ItemService::new(state.db).list(&query).await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ItemDetail>> {
    let item = ItemService::new(state.db).get(item_id).await?;
    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = ItemService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    let item = ItemService::new(state.db).update(item_id, input).await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user.0)?;
    ItemService::new(state.db).delete(item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
