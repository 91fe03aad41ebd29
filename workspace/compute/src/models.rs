pub mod arima;
pub mod drift;
pub mod numeric;
pub mod prophet;
pub mod registry;

use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::series::{TimePoint, TimeSeries};

pub use arima::ArimaAdapter;
pub use drift::DriftAdapter;
pub use prophet::{ProphetAdapter, ProphetConfig};
pub use registry::{Capabilities, ModelDescription, ModelRegistry};

/// Two-sided 95% normal quantile used for prediction intervals.
pub const Z_95: f64 = 1.959_963_984_540_054;

/// Forecasting model families a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Arima,
    Prophet,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Arima, ModelKind::Prophet];
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Arima => write!(f, "ARIMA"),
            ModelKind::Prophet => write!(f, "Prophet"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arima" | "auto_arima" => Ok(ModelKind::Arima),
            "prophet" => Ok(ModelKind::Prophet),
            other => Err(format!("unknown model '{other}', expected 'arima' or 'prophet'")),
        }
    }
}

/// What an adapter hands back for a fitted series.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    /// Point forecasts, one per horizon step
    pub forecast: Vec<f64>,
    /// Lower bound of the 95% interval, when the model provides one
    pub lower: Option<Vec<f64>>,
    /// Upper bound of the 95% interval, when the model provides one
    pub upper: Option<Vec<f64>>,
    /// Time of each forecast step
    pub future: Vec<TimePoint>,
    /// In-sample predictions
    pub fitted: Vec<f64>,
    /// Index of the observation that `fitted[0]` predicts
    pub fitted_offset: usize,
}

impl ModelOutput {
    /// Observed values aligned with `fitted`.
    pub fn aligned_actuals<'a>(&self, series: &'a TimeSeries) -> &'a [f64] {
        let start = self.fitted_offset.min(series.values.len());
        let end = (start + self.fitted.len()).min(series.values.len());
        &series.values[start..end]
    }
}

/// A forecasting model family. Implementations are stateless between calls.
pub trait ForecastModel: Send + Sync {
    /// Human-readable adapter name.
    fn name(&self) -> &'static str;

    /// Fits the model on `series` and forecasts `horizon` steps past its end.
    fn fit_and_forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ModelOutput>;
}
