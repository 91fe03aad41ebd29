use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json},
};
use common::{FigureDto, SummaryTable};
use compute::error::ComputeError;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::helpers::errors::{compute_error, internal_error};
use crate::render::figures::{stats_visualization, StatsPlotKind};
use crate::render::tables::summary_csv;
use crate::render::{NO_DATA_SUMMARY, NO_NUMERIC_SUMMARY};
use crate::schemas::{ApiError, ApiResponse, AppState};

pub const SUMMARY_FILENAME: &str = "summary_statistics.csv";

/// Statistics plot offered in the summary tab
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub enum StatsPlotType {
    #[default]
    Boxplot,
    Histogram,
}

impl From<StatsPlotType> for StatsPlotKind {
    fn from(value: StatsPlotType) -> Self {
        match value {
            StatsPlotType::Boxplot => StatsPlotKind::Boxplot,
            StatsPlotType::Histogram => StatsPlotKind::Histogram,
        }
    }
}

/// Query parameters for the statistics plot
#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryPlotQuery {
    /// Plot type (default: Boxplot)
    pub plot_type: Option<StatsPlotType>,
}

/// Summary statistics of every numeric column
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/summary",
    tag = "summary",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Summary table, or a note when there is nothing to summarize", body = ApiResponse<SummaryTable>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_summary(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SummaryTable>>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    let summary = session.observer().summary().clone();
    debug!("Summary has {} rows", summary.rows.len());

    Ok(Json(ApiResponse::ok(summary, "Summary retrieved successfully")))
}

/// Boxplot or histogram of the numeric columns
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/summary/plot",
    tag = "summary",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        SummaryPlotQuery
    ),
    responses(
        (status = 200, description = "Figure, or a placeholder when there is nothing to plot", body = ApiResponse<FigureDto>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_summary_plot(
    Path(id): Path<Uuid>,
    Query(query): Query<SummaryPlotQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FigureDto>>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    let kind = StatsPlotKind::from(query.plot_type.unwrap_or_default());
    let figure = stats_visualization(session.state().dataset(), kind);

    Ok(Json(ApiResponse::ok(figure, "Summary plot retrieved successfully")))
}

/// Download the summary statistics as CSV
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/summary/download",
    tag = "summary",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Summary CSV", body = String, content_type = "text/csv"),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse),
        (status = 422, description = "Nothing to summarize", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn download_summary(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    let dataset = session
        .state()
        .dataset()
        .ok_or_else(|| compute_error(&ComputeError::Validation(NO_DATA_SUMMARY.to_string())))?;
    if dataset.numeric_columns().is_empty() {
        return Err(compute_error(&ComputeError::Validation(NO_NUMERIC_SUMMARY.to_string())));
    }

    let csv = summary_csv(dataset).map_err(|e| internal_error(format!("Failed to write summary CSV: {e}")))?;
    info!("Serving {} for session {}", SUMMARY_FILENAME, id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{SUMMARY_FILENAME}\"")),
        ],
        csv,
    ))
}
