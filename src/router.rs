use crate::handlers::{
    datasets::{data_visualization, preview_dataset, put_dataset, update_selection, upload_dataset},
    forecasts::{get_forecast_metrics, get_forecast_plot, run_forecast},
    health::health_check,
    models::list_models,
    sessions::{close_session, create_session, get_session},
    summary::{download_summary, get_summary, get_summary_plot},
    templates::download_template,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.settings.server.request_timeout_secs);
    let body_limit = state.settings.server.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Models and assets
        .route("/api/v1/models", get(list_models))
        .route("/api/v1/template", get(download_template))
        // Session lifecycle
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/:id", get(get_session).delete(close_session))
        // Data tab
        .route("/api/v1/sessions/:id/dataset", put(put_dataset).get(preview_dataset))
        .route("/api/v1/sessions/:id/upload", post(upload_dataset))
        .route("/api/v1/sessions/:id/selection", put(update_selection))
        .route("/api/v1/sessions/:id/visualization", get(data_visualization))
        // Summary tab
        .route("/api/v1/sessions/:id/summary", get(get_summary))
        .route("/api/v1/sessions/:id/summary/plot", get(get_summary_plot))
        .route("/api/v1/sessions/:id/summary/download", get(download_summary))
        // Forecast tab
        .route("/api/v1/sessions/:id/forecast", post(run_forecast))
        .route("/api/v1/sessions/:id/forecast/plot", get(get_forecast_plot))
        .route("/api/v1/sessions/:id/forecast/metrics", get(get_forecast_metrics))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout))
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
