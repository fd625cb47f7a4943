//! Warehouse transfer handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::transfer::{Transfer, TransferDetail, TransferInput};
use crate::services::{MovementQuery, TransferService};
use crate::AppState;

pub async fn list_transfers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<PaginatedResponse<Transfer>>> {
    let documents = TransferService::new(state.db).list(&query).await?;
    Ok(Json(documents))
}

pub async fn get_transfer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransferDetail>> {
    let detail = TransferService::new(state.db).get(id).await?;
    Ok(Json(detail))
}

pub async fn create_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<TransferInput>,
) -> AppResult<(StatusCode, Json<TransferDetail>)> {
    let detail = TransferService::new(state.db)
        .create(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update_transfer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<TransferInput>,
) -> AppResult<Json<TransferDetail>> {
    let detail = TransferService::new(state.db).update(id, input).await?;
    Ok(Json(detail))
}

pub async fn delete_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user.0)?;
    TransferService::new(state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
