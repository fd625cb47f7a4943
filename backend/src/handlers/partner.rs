//! Supplier and customer handlers
//!
//! Both resources share one service parameterized by [`PartnerKind`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::types::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::partner::{Partner, PartnerInput, UpdatePartnerInput};
use crate::services::{PartnerKind, PartnerService, SearchQuery};
use crate::AppState;

async fn list_partners(
    state: AppState,
    kind: PartnerKind,
    query: SearchQuery,
) -> AppResult<Json<PaginatedResponse<Partner>>> {
    let partners = PartnerService::new(state.db, kind).list(&query).await?;
    Ok(Json(partners))
}

async fn get_partner(state: AppState, kind: PartnerKind, id: Uuid) -> AppResult<Json<Partner>> {
    let partner = PartnerService::new(state.db, kind).get(id).await?;
    Ok(Json(partner))
}

async fn create_partner(
    state: AppState,
    kind: PartnerKind,
    input: PartnerInput,
) -> AppResult<(StatusCode, Json<Partner>)> {
    let partner = PartnerService::new(state.db, kind).create(input).await?;
    Ok((StatusCode::CREATED, Json(partner)))
}

async fn update_partner(
    state: AppState,
    kind: PartnerKind,
    id: Uuid,
    input: UpdatePartnerInput,
) -> AppResult<Json<Partner>> {
    let partner = PartnerService::new(state.db, kind).update(id, input).await?;
    Ok(Json(partner))
}

async fn delete_partner(state: AppState, kind: PartnerKind, id: Uuid) -> AppResult<StatusCode> {
    PartnerService::new(state.db, kind).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Suppliers

pub async fn list_suppliers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<PaginatedResponse<Partner>>> {
    list_partners(state, PartnerKind::Supplier, query).await
}

pub async fn get_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Partner>> {
    get_partner(state, PartnerKind::Supplier, supplier_id).await
}

pub async fn create_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<PartnerInput>,
) -> AppResult<(StatusCode, Json<Partner>)> {
    create_partner(state, PartnerKind::Supplier, input).await
}

pub async fn update_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdatePartnerInput>,
) -> AppResult<Json<Partner>> {
    update_partner(state, PartnerKind::Supplier, supplier_id, input).await
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user.0)?;
    delete_partner(state, PartnerKind::Supplier, supplier_id).await
}

// Customers

pub async fn list_customers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<PaginatedResponse<Partner>>> {
    list_partners(state, PartnerKind::Customer, query).await
}

pub async fn get_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Partner>> {
    get_partner(state, PartnerKind::Customer, customer_id).await
}

pub async fn create_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<PartnerInput>,
) -> AppResult<(StatusCode, Json<Partner>)> {
    create_partner(state, PartnerKind::Customer, input).await
}

pub async fn update_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdatePartnerInput>,
) -> AppResult<Json<Partner>> {
    update_partner(state, PartnerKind::Customer, customer_id, input).await
}

pub async fn delete_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user.0)?;
    delete_partner(state, PartnerKind::Customer, customer_id).await
}
