use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use tracing::{info, instrument, warn};

use crate::helpers::errors::api_error;
use crate::schemas::{ApiError, AppState};

pub const TEMPLATE_FILENAME: &str = "sample_data.csv";

/// Download the demo CSV template
#[utoipa::path(
    get,
    path = "/api/v1/template",
    tag = "data",
    responses(
        (status = 200, description = "Template CSV", body = String, content_type = "text/csv"),
        (status = 404, description = "Template asset missing", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn download_template(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let path = &state.settings.assets.template_path;
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        warn!("Template asset {} unavailable: {}", path, e);
        api_error(StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND", format!("Template file {path} not found"))
    })?;
    info!("Serving template {} ({} bytes)", path, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{TEMPLATE_FILENAME}\"")),
        ],
        bytes,
    ))
}
