use tracing::{debug, instrument};

use crate::error::{ComputeError, Result};

/// Forecast accuracy over the overlapping part of actual and predicted values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
}

impl Metrics {
    /// Computes MAPE, RMSE and MAE over `min(actual.len(), predicted.len())` pairs.
    ///
    /// Fails when there is nothing to compare or when an actual value is zero,
    /// since MAPE is undefined there.
    #[instrument(skip_all, fields(actual = actual.len(), predicted = predicted.len()))]
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        let overlap = actual.len().min(predicted.len());
        if overlap == 0 {
            return Err(ComputeError::Metrics(
                "no overlapping observations to compare".to_string(),
            ));
        }

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut pct_sum = 0.0;
        for (i, (a, p)) in actual.iter().zip(predicted).take(overlap).enumerate() {
            if *a == 0.0 {
                return Err(ComputeError::Metrics(format!(
                    "MAPE is undefined: actual value at position {i} is zero"
                )));
            }
            let err = a - p;
            abs_sum += err.abs();
            sq_sum += err * err;
            pct_sum += (err / a).abs();
        }

        let n = overlap as f64;
        let metrics = Self {
            mape: pct_sum / n * 100.0,
            rmse: (sq_sum / n).sqrt(),
            mae: abs_sum / n,
        };
        debug!(?metrics, overlap, "Computed forecast metrics");
        Ok(metrics)
    }

    /// Display rows for the metrics table: MAPE, RMSE, MAE in that order.
    pub fn rows(&self) -> Vec<(String, String)> {
        vec![
            ("MAPE (%)".to_string(), format!("{:.2}%", self.mape)),
            ("RMSE".to_string(), format!("{:.2}", self.rmse)),
            ("MAE".to_string(), format!("{:.2}", self.mae)),
        ]
    }
}
