use axum::{extract::State, response::Json};
use common::ModelInfo;
use tracing::{debug, instrument};

use crate::helpers::converters::model_info;
use crate::schemas::{ApiResponse, AppState};

/// List the model families and the adapter serving each
#[utoipa::path(
    get,
    path = "/api/v1/models",
    tag = "forecast",
    responses(
        (status = 200, description = "Models retrieved successfully", body = ApiResponse<Vec<ModelInfo>>)
    )
)]
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Json<ApiResponse<Vec<ModelInfo>>> {
    let models: Vec<ModelInfo> = state.registry.describe().into_iter().map(model_info).collect();
    debug!("Registry serves {} model families", models.len());
    Json(ApiResponse::ok(models, "Models retrieved successfully"))
}
