//! Stock count (stok opname) handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::stock_count::{StockCount, StockCountDetail, StockCountInput};
use crate::services::{MovementQuery, StockCountService};
use crate::AppState;

pub async fn list_stock_counts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<PaginatedResponse<StockCount>>> {
    let documents = StockCountService::new(state.db).list(&query).await?;
    Ok(Json(documents))
}

pub async fn get_stock_count(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StockCountDetail>> {
    let detail = StockCountService::new(state.db).get(id).await?;
    Ok(Json(detail))
}

pub async fn create_stock_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockCountInput>,
) -> AppResult<(StatusCode, Json<StockCountDetail>)> {
    let detail = StockCountService::new(state.db)
        .create(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Reverses the recorded differences and counts again against current stock
pub async fn update_stock_count(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<StockCountInput>,
) -> AppResult<Json<StockCountDetail>> {
    let detail = StockCountService::new(state.db).update(id, input).await?;
    Ok(Json(detail))
}

pub async fn delete_stock_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user.0)?;
    StockCountService::new(state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
