use axum::{http::StatusCode, response::Json};
use common::{
    ColumnDto, ColumnKindDto, DatasetInfo, DatasetPreview, FigureDto, ForecastPointDto, ForecastResultDto,
    MetricRow, MetricsDto, ModelChoice, ModelInfo, SelectionDto, SessionInfo, SummaryRow, SummaryTable,
    TimePointDto, UpdateSelectionRequest,
};
use compute::models::ModelRegistry;
use compute::session::Session;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::config::Settings;
use crate::handlers::forecasts::RunForecastRequest;
use crate::handlers::summary::StatsPlotType;
use crate::helpers::errors::session_not_found;
use crate::render::RenderBindings;

/// A session and its render bindings. The mutex serializes every event of a session.
pub type SessionHandle = Arc<Mutex<Session<RenderBindings>>>;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Open dashboard sessions, dropped after the configured idle time
    pub sessions: Cache<Uuid, SessionHandle>,
    /// Forecast adapters, resolved at startup
    pub registry: Arc<ModelRegistry>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Looks up a session, refreshing its idle timer.
    pub async fn session(&self, id: Uuid) -> Result<SessionHandle, ApiError> {
        self.sessions.get(&id).await.ok_or_else(|| session_not_found(id))
    }
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self { data, message: message.into(), success: true }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Number of open sessions
    pub sessions: u64,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::models::list_models,
        crate::handlers::templates::download_template,
        crate::handlers::sessions::create_session,
        crate::handlers::sessions::get_session,
        crate::handlers::sessions::close_session,
        crate::handlers::datasets::put_dataset,
        crate::handlers::datasets::upload_dataset,
        crate::handlers::datasets::preview_dataset,
        crate::handlers::datasets::update_selection,
        crate::handlers::datasets::data_visualization,
        crate::handlers::summary::get_summary,
        crate::handlers::summary::get_summary_plot,
        crate::handlers::summary::download_summary,
        crate::handlers::forecasts::run_forecast,
        crate::handlers::forecasts::get_forecast_plot,
        crate::handlers::forecasts::get_forecast_metrics,
    ),
    components(
        schemas(
            ApiResponse<SessionInfo>,
            ApiResponse<DatasetInfo>,
            ApiResponse<DatasetPreview>,
            ApiResponse<SelectionDto>,
            ApiResponse<FigureDto>,
            ApiResponse<SummaryTable>,
            ApiResponse<ForecastResultDto>,
            ApiResponse<Vec<MetricRow>>,
            ApiResponse<Vec<ModelInfo>>,
            ErrorResponse,
            HealthResponse,
            RunForecastRequest,
            StatsPlotType,
            UpdateSelectionRequest,
            SessionInfo,
            SelectionDto,
            DatasetInfo,
            DatasetPreview,
            ColumnDto,
            ColumnKindDto,
            FigureDto,
            SummaryTable,
            SummaryRow,
            ForecastResultDto,
            ForecastPointDto,
            TimePointDto,
            MetricsDto,
            MetricRow,
            ModelChoice,
            ModelInfo,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Dashboard session lifecycle"),
        (name = "data", description = "Upload, preview and visualize data"),
        (name = "summary", description = "Summary statistics"),
        (name = "forecast", description = "Forecast runs and their outputs"),
    ),
    info(
        title = "forecastdash API",
        description = "Time series forecasting dashboard: upload a CSV, explore it, and forecast it with ARIMA or Prophet",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_envelope_wraps_shared_dto() {
        let info = SessionInfo {
            id: "abc".to_string(),
            state: "idle".to_string(),
            rows: None,
            selection: SelectionDto {
                time_choices: Vec::new(),
                target_choices: Vec::new(),
                time_column: None,
                target_column: None,
            },
            latest_model: None,
        };
        let value = serde_json::to_value(ApiResponse::ok(info.clone(), "Session created")).unwrap();

        let mut keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(keys, ["data", "message", "success"]);
        assert_eq!(value["success"], true);

        let data: SessionInfo = serde_json::from_value(value["data"].clone()).unwrap();
        assert_eq!(data, info);
    }
}
