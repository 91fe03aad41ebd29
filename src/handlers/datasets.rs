use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    response::Json,
};
use axum_valid::Valid;
use common::{DatasetInfo, DatasetPreview, FigureDto, SelectionDto, UpdateSelectionRequest};
use compute::error::ComputeError;
use serde::Deserialize;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::helpers::converters::{dataset_info, dataset_preview, selection};
use crate::helpers::errors::compute_error;
use crate::schemas::{ApiError, ApiResponse, AppState};

/// Multipart field carrying the uploaded CSV
pub const UPLOAD_FIELD: &str = "file";

/// Query parameters for previewing dataset rows
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct PreviewQuery {
    /// First row to return (default: 0)
    pub offset: Option<usize>,
    /// Rows to return (default: preview.default_rows)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

async fn ingest(state: &AppState, id: Uuid, bytes: &[u8]) -> Result<DatasetInfo, ApiError> {
    let handle = state.session(id).await?;
    let mut session = handle.lock().await;

    session.upload(bytes).map_err(|e| compute_error(&e))?;
    let current = session.state();
    let dataset = current
        .dataset()
        .ok_or_else(|| compute_error(&ComputeError::Ingestion("dataset was not stored".to_string())))?;
    info!("Session {} loaded {} rows", id, dataset.row_count());

    Ok(dataset_info(dataset, current.selection()))
}

/// Upload a CSV file as the raw request body
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{id}/dataset",
    tag = "data",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    request_body(content = String, content_type = "text/csv", description = "CSV file with a header row"),
    responses(
        (status = 200, description = "Dataset uploaded successfully", body = ApiResponse<DatasetInfo>),
        (status = 400, description = "File could not be parsed", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(size = body.len()))]
pub async fn put_dataset(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse<DatasetInfo>>, ApiError> {
    trace!("Entering put_dataset function");
    let info = ingest(&state, id, &body).await?;
    Ok(Json(ApiResponse::ok(info, "Dataset uploaded successfully")))
}

/// Upload a CSV file as multipart form data
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/upload",
    tag = "data",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    request_body(content = String, content_type = "multipart/form-data", description = "Form with a `file` field"),
    responses(
        (status = 200, description = "Dataset uploaded successfully", body = ApiResponse<DatasetInfo>),
        (status = 400, description = "Missing file or unparseable CSV", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, multipart))]
pub async fn upload_dataset(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<DatasetInfo>>, ApiError> {
    trace!("Entering upload_dataset function");
    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        compute_error(&ComputeError::Ingestion(format!("invalid multipart body: {e}")))
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }
        debug!("Reading uploaded file {:?}", field.file_name());
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let info = ingest(&state, id, &bytes).await?;
        return Ok(Json(ApiResponse::ok(info, "Dataset uploaded successfully")));
    }

    warn!("Upload to session {} had no '{}' field", id, UPLOAD_FIELD);
    Err(compute_error(&ComputeError::Ingestion(format!(
        "multipart body has no '{UPLOAD_FIELD}' field"
    ))))
}

/// Preview rows of the uploaded dataset
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/dataset",
    tag = "data",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        PreviewQuery
    ),
    responses(
        (status = 200, description = "Preview retrieved successfully", body = ApiResponse<DatasetPreview>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse),
        (status = 422, description = "No dataset uploaded", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn preview_dataset(
    Path(id): Path<Uuid>,
    Valid(Query(query)): Valid<Query<PreviewQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DatasetPreview>>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    let dataset = session
        .state()
        .dataset()
        .ok_or_else(|| compute_error(&ComputeError::Validation("no data has been uploaded".to_string())))?;

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(state.settings.preview.default_rows);
    debug!("Previewing rows {}..{} of {}", offset, offset.saturating_add(limit), dataset.row_count());

    Ok(Json(ApiResponse::ok(
        dataset_preview(dataset, offset, limit),
        "Preview retrieved successfully",
    )))
}

/// Change the selected time and target columns
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{id}/selection",
    tag = "data",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    request_body = UpdateSelectionRequest,
    responses(
        (status = 200, description = "Selection updated successfully", body = ApiResponse<SelectionDto>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_selection(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateSelectionRequest>,
) -> Result<Json<ApiResponse<SelectionDto>>, ApiError> {
    let handle = state.session(id).await?;
    let mut session = handle.lock().await;
    session.select(request.time_column, request.target_column);

    Ok(Json(ApiResponse::ok(
        selection(session.state().selection()),
        "Selection updated successfully",
    )))
}

/// Plot of the first numeric column with its trend line
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/visualization",
    tag = "data",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Figure, or a placeholder before any upload", body = ApiResponse<FigureDto>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn data_visualization(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FigureDto>>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    let figure = session.observer().data_figure().clone();

    Ok(Json(ApiResponse::ok(figure, "Visualization retrieved successfully")))
}
