use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Model family offered in the model dropdown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    #[serde(alias = "auto_arima")]
    Arima,
    Prophet,
}

/// Position on the time axis: a timestamp, or a row step for label axes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(untagged)]
pub enum TimePointDto {
    Timestamp(NaiveDateTime),
    Step(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ForecastPointDto {
    pub time: TimePointDto,
    pub value: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MetricsDto {
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    pub rmse: f64,
    pub mae: f64,
}

/// One row of the metrics table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

/// Result of a forecast run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ForecastResultDto {
    pub model: ModelChoice,
    /// Adapter that produced the forecast
    pub adapter: String,
    /// True when the requested model was unavailable and a fallback was used
    pub degraded: bool,
    pub time_column: String,
    pub target_column: String,
    pub horizon: usize,
    pub forecast: Vec<ForecastPointDto>,
    pub metrics: MetricsDto,
    pub metrics_table: Vec<MetricRow>,
}

/// Plotly figure JSON, plus the placeholder text when nothing is plotted yet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FigureDto {
    #[schema(value_type = Object)]
    pub figure: serde_json::Value,
    pub placeholder: Option<String>,
}

/// Availability of a model family.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ModelInfo {
    pub model: ModelChoice,
    pub available: bool,
    pub adapter: String,
}
