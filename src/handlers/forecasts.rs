use axum::{
    extract::{Path, State},
    response::Json,
};
use axum_valid::Valid;
use common::{FigureDto, ForecastResultDto, MetricRow, ModelChoice};
use compute::error::ComputeError;
use compute::session::RunOutcome;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::helpers::converters::{forecast_result, model_kind};
use crate::helpers::errors::{compute_error, guard_rejected, internal_error};
use crate::schemas::{ApiError, ApiResponse, AppState};

/// Request body for the run trigger
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct RunForecastRequest {
    /// Model family: "arima" or "prophet"
    pub model: ModelChoice,
    /// Periods to forecast, 1 to 100 (default: forecast.default_horizon)
    #[validate(range(min = 1, max = 100))]
    pub horizon: Option<usize>,
    /// Replaces the selected time column before running
    #[validate(length(min = 1))]
    pub time_column: Option<String>,
    /// Replaces the selected target column before running
    #[validate(length(min = 1))]
    pub target_column: Option<String>,
}

/// Run a forecast with the session's data and selection
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/forecast",
    tag = "forecast",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    request_body = RunForecastRequest,
    responses(
        (status = 200, description = "Forecast completed", body = ApiResponse<ForecastResultDto>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse),
        (status = 422, description = "Run skipped by its guard, or the model could not be fitted", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn run_forecast(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<RunForecastRequest>>,
) -> Result<Json<ApiResponse<ForecastResultDto>>, ApiError> {
    trace!("Entering run_forecast function");
    let handle = state.session(id).await?;
    let registry = state.registry.clone();
    let horizon = request.horizon.unwrap_or(state.settings.forecast.default_horizon);
    let kind = model_kind(request.model);
    debug!("Running {} with horizon {} for session {}", kind, horizon, id);

    let result = tokio::task::spawn_blocking(move || {
        let mut session = handle.blocking_lock();
        session.select(request.time_column, request.target_column);

        match session.run(kind, horizon, &registry) {
            Ok(RunOutcome::Completed) => session
                .state()
                .latest_result()
                .map(forecast_result)
                .ok_or_else(|| compute_error(&ComputeError::ModelFit("forecast result was not stored".to_string()))),
            Ok(RunOutcome::Skipped(reason)) => Err(guard_rejected(&reason)),
            Err(err) => Err(compute_error(&err)),
        }
    })
    .await
    .map_err(|e| internal_error(format!("Forecast task failed: {e}")))??;

    info!("Session {} displays {:?} forecast from {}", id, result.model, result.adapter);
    Ok(Json(ApiResponse::ok(result, "Forecast completed successfully")))
}

/// Forecast figure, or the placeholder before any run
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/forecast/plot",
    tag = "forecast",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Forecast figure retrieved successfully", body = ApiResponse<FigureDto>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_forecast_plot(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FigureDto>>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    let figure = session.observer().forecast_figure().clone();

    Ok(Json(ApiResponse::ok(figure, "Forecast figure retrieved successfully")))
}

/// Metrics table, or the placeholder row before any run
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/forecast/metrics",
    tag = "forecast",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Metrics retrieved successfully", body = ApiResponse<Vec<MetricRow>>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_forecast_metrics(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MetricRow>>>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    let metrics = session.observer().metrics_table().to_vec();

    Ok(Json(ApiResponse::ok(metrics, "Metrics retrieved successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(horizon: Option<usize>) -> RunForecastRequest {
        RunForecastRequest { model: ModelChoice::Arima, horizon, time_column: None, target_column: None }
    }

    #[test]
    fn test_horizon_range() {
        assert!(request(None).validate().is_ok());
        assert!(request(Some(1)).validate().is_ok());
        assert!(request(Some(100)).validate().is_ok());
        assert!(request(Some(0)).validate().is_err());
        assert!(request(Some(101)).validate().is_err());
    }
}
