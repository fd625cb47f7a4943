//! Shelf code (kode rak) handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::shelf_code::{
    CreateShelfCodeInput, ShelfCode, ShelfCodeQuery, UpdateShelfCodeInput,
};
use crate::services::ShelfCodeService;
use crate::AppState;

pub async fn list_shelf_codes(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ShelfCodeQuery>,
) -> AppResult<Json<PaginatedResponse<ShelfCode>>> {
    let shelf_codes = ShelfCodeService::new(state.db).list(&query).await?;
    Ok(Json(shelf_codes))
}

pub async fn get_shelf_code(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shelf_code_id): Path<Uuid>,
) -> AppResult<Json<ShelfCode>> {
    let shelf_code = ShelfCodeService::new(state.db).get(shelf_code_id).await?;
    Ok(Json(shelf_code))
}

pub async fn create_shelf_code(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateShelfCodeInput>,
) -> AppResult<(StatusCode, Json<ShelfCode>)> {
    let shelf_code = ShelfCodeService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(shelf_code)))
}

pub async fn update_shelf_code(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shelf_code_id): Path<Uuid>,
    Json(input): Json<UpdateShelfCodeInput>,
) -> AppResult<Json<ShelfCode>> {
    let shelf_code = ShelfCodeService::new(state.db)
        .update(shelf_code_id, input)
        .await?;
    Ok(Json(shelf_code))
}

pub async fn delete_shelf_code(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shelf_code_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user.0)?;
    ShelfCodeService::new(state.db).delete(shelf_code_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
