//! Spreadsheet import handlers

use axum::{
    extract::{Multipart, Path, State},
    response::Response,
    Json,
};
use shared::import::ImportKind;

use crate::error::{AppError, AppResult};
use crate::handlers::export::attachment;
use crate::middleware::CurrentUser;
use crate::services::import::ImportSummary;
use crate::services::spreadsheet::{self, XLSX_CONTENT_TYPE};
use crate::services::ImportService;
use crate::AppState;

fn parse_kind(kind: &str) -> AppResult<ImportKind> {
    ImportKind::parse(kind).ok_or_else(|| AppError::NotFound(format!("Import type '{}'", kind)))
}

/// Empty workbook with the header row for one import type
pub async fn download_template(
    _current_user: CurrentUser,
    Path(kind): Path<String>,
) -> AppResult<Response> {
    let kind = parse_kind(&kind)?;
    let bytes = spreadsheet::import_template(kind)?;
    let file_name = format!("{}-template.xlsx", kind.as_str());
    Ok(attachment(&file_name, XLSX_CONTENT_TYPE, bytes))
}

/// Imports the multipart field `file`; any row error rejects the whole file
pub async fn import_file(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    let kind = parse_kind(&kind)?;
    let max_bytes = state.config.import.max_upload_bytes;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation("file", &e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation("file", &e.body_text()))?;
        upload = Some((file_name, bytes));
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::validation("file", "A file upload is required"))?;
    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge { limit: max_bytes });
    }

    tracing::info!(
        kind = kind.as_str(),
        file = file_name.as_deref().unwrap_or("-"),
        size = bytes.len(),
        "Import started"
    );

    let summary = ImportService::new(state.db, &state.config.import)
        .import(kind, current_user.0.user_id, file_name.as_deref(), &bytes)
        .await?;

    Ok(Json(summary))
}
