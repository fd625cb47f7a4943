//! Outbound (stok keluar) handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::outbound::{OutboundTransaction, OutboundDetail, OutboundInput};
use crate::services::{MovementQuery, OutboundService};
use crate::AppState;

pub async fn list_outbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<PaginatedResponse<OutboundTransaction>>> {
    let documents = OutboundService::new(state.db).list(&query).await?;
    Ok(Json(documents))
}

pub async fn get_outbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OutboundDetail>> {
    let detail = OutboundService::new(state.db).get(id).await?;
    Ok(Json(detail))
}

pub async fn create_outbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<OutboundInput>,
) -> AppResult<(StatusCode, Json<OutboundDetail>)> {
    let detail = OutboundService::new(state.db)
        .create(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update_outbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<OutboundInput>,
) -> AppResult<Json<OutboundDetail>> {
    let detail = OutboundService::new(state.db).update(id, input).await?;
    Ok(Json(detail))
}

pub async fn delete_outbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user.0)?;
    OutboundService::new(state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
