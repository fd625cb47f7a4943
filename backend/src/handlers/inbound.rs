//! Inbound (stok masuk) handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::inbound::{InboundTransaction, InboundDetail, InboundInput};
use crate::services::{MovementQuery, InboundService};
use crate::AppState;

pub async fn list_inbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<PaginatedResponse<InboundTransaction>>> {
    let documents = InboundService::new(state.db).list(&query).await?;
    Ok(Json(documents))
}

pub async fn get_inbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InboundDetail>> {
    let detail = InboundService::new(state.db).get(id).await?;
    Ok(Json(detail))
}

/// Records received goods and adds them to stock
pub async fn create_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<InboundInput>,
) -> AppResult<(StatusCode, Json<InboundDetail>)> {
    let detail = InboundService::new(state.db)
        .create(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update_inbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<InboundInput>,
) -> AppResult<Json<InboundDetail>> {
    let detail = InboundService::new(state.db).update(id, input).await?;
    Ok(Json(detail))
}

/// Fails with 422 when the received goods were already shipped out
pub async fn delete_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user.0)?;
    InboundService::new(state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
