//! Stock level handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{
    AssignShelfInput, LowStockItem, StockCard, StockCardQuery, StockQuery, StockRow,
};
use crate::services::StockService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub limit: Option<i64>,
}

pub async fn list_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<PaginatedResponse<StockRow>>> {
    let stock = StockService::new(state.db).list(&query).await?;
    Ok(Json(stock))
}

pub async fn list_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<LowStockItem>>> {
    let items = StockService::new(state.db).low_stock(query.limit).await?;
    Ok(Json(items))
}

/// Movement history of one item with a running balance
pub async fn get_stock_card(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Query(query): Query<StockCardQuery>,
) -> AppResult<Json<StockCard>> {
    let card = StockService::new(state.db).stock_card(item_id, &query).await?;
    Ok(Json(card))
}

pub async fn assign_shelf(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(stock_id): Path<Uuid>,
    Json(input): Json<AssignShelfInput>,
) -> AppResult<Json<StockRow>> {
    let row = StockService::new(state.db).assign_shelf(stock_id, input).await?;
    Ok(Json(row))
}
