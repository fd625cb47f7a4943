//! Dashboard handler

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::dashboard::DashboardSummary;
use crate::services::DashboardService;
use crate::AppState;

pub async fn get_dashboard(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<DashboardSummary>> {
    let summary = DashboardService::new(state.db).summary().await?;
    Ok(Json(summary))
}
