use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::SessionInfo;
use compute::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use crate::helpers::converters::session_info;
use crate::render::RenderBindings;
use crate::schemas::{ApiError, ApiResponse, AppState};

/// Open a new dashboard session
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created successfully", body = ApiResponse<SessionInfo>)
    )
)]
#[instrument(skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<SessionInfo>>) {
    trace!("Entering create_session function");
    let id = Uuid::new_v4();
    let session = Session::new(RenderBindings::default(), state.settings.forecast.max_horizon);
    let info = session_info(id, session.state());

    state.sessions.insert(id, Arc::new(Mutex::new(session))).await;
    info!("Session {} created", id);

    (StatusCode::CREATED, Json(ApiResponse::ok(info, "Session created successfully")))
}

/// Get the status of a session
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Session retrieved successfully", body = ApiResponse<SessionInfo>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionInfo>>, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    debug!("Session {} is {}", id, session.state().dispatch());

    Ok(Json(ApiResponse::ok(session_info(id, session.state()), "Session retrieved successfully")))
}

/// Close a session and drop its data
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Session closed; returns its final status", body = ApiResponse<SessionInfo>),
        (status = 404, description = "Session not found", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn close_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionInfo>>, ApiError> {
    let handle = state.session(id).await?;
    state.sessions.invalidate(&id).await;
    let session = handle.lock().await;
    info!("Session {} closed", id);

    Ok(Json(ApiResponse::ok(session_info(id, session.state()), "Session closed successfully")))
}
