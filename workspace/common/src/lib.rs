//! Common transport-layer types shared between the backend and its clients.
//! These structs mirror the handlers' response payloads so a front end can
//! deserialize API responses without duplicating shapes.

mod dataset;
mod forecast;
mod summary;

pub use dataset::{ColumnDto, ColumnKindDto, DatasetInfo, DatasetPreview, SelectionDto, UpdateSelectionRequest};
pub use forecast::{
    FigureDto, ForecastPointDto, ForecastResultDto, MetricRow, MetricsDto, ModelChoice, ModelInfo, TimePointDto,
};
pub use summary::{SummaryRow, SummaryTable};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle snapshot of one dashboard session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SessionInfo {
    /// Session identifier
    pub id: String,
    /// Forecast dispatch state: idle, running or displayed
    pub state: String,
    /// Rows in the uploaded dataset, if any
    pub rows: Option<usize>,
    pub selection: SelectionDto,
    /// Model of the displayed forecast, if any
    pub latest_model: Option<ModelChoice>,
}
