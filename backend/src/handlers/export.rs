//! Report export handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::export::{ExportQuery, ExportReport};
use crate::services::ExportService;
use crate::AppState;

/// Build a file download response
pub(crate) fn attachment(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub async fn export_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(report): Path<String>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let report = ExportReport::parse(&report)
        .ok_or_else(|| AppError::NotFound(format!("Report '{}'", report)))?;

    let file = ExportService::new(state.db).export(report, &query).await?;
    tracing::info!(file = %file.file_name, size = file.bytes.len(), "Report exported");

    Ok(attachment(&file.file_name, file.content_type, file.bytes))
}
