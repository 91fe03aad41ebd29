use axum::{http::StatusCode, response::Json};
use compute::error::ComputeError;
use compute::session::GuardReason;
use tracing::{error, warn};
use uuid::Uuid;

use crate::schemas::{ApiError, ErrorResponse};

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    let error_response = ErrorResponse {
        error: message.into(),
        code: code.to_string(),
        success: false,
    };
    (status, Json(error_response))
}

/// Maps a compute failure onto its HTTP status and error code.
pub fn compute_error(err: &ComputeError) -> ApiError {
    let status = match err {
        ComputeError::Ingestion(_) => StatusCode::BAD_REQUEST,
        ComputeError::Validation(_) | ComputeError::ModelFit(_) | ComputeError::Metrics(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ComputeError::DataFrame(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Compute error: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    api_error(status, err.code(), err.to_string())
}

/// A run trigger the guard ignored. Session state is unchanged.
pub fn guard_rejected(reason: &GuardReason) -> ApiError {
    api_error(
        StatusCode::UNPROCESSABLE_ENTITY,
        "FORECAST_SKIPPED",
        format!("Forecast skipped: {reason}"),
    )
}

pub fn session_not_found(id: Uuid) -> ApiError {
    warn!("Session {} not found", id);
    api_error(StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", format!("Session {id} not found"))
}

pub fn internal_error(message: impl Into<String>) -> ApiError {
    let message = message.into();
    error!("{}", message);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_error_mapping() {
        let (status, Json(body)) = compute_error(&ComputeError::Ingestion("bad csv".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INGESTION_ERROR");
        assert!(!body.success);

        let (status, Json(body)) = compute_error(&ComputeError::ModelFit("singular".into()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.code, "MODEL_FIT_ERROR");

        let (status, _) = compute_error(&ComputeError::DataFrame("oops".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_guard_rejected() {
        let (status, Json(body)) = guard_rejected(&GuardReason::NoDataset);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.code, "FORECAST_SKIPPED");
        assert!(body.error.contains("no data has been uploaded"));
    }
}
