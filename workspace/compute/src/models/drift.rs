use tracing::{debug, instrument};

use super::{ForecastModel, ModelOutput};
use crate::error::{ComputeError, Result};
use crate::series::TimeSeries;

/// Values the slope is measured over.
const WINDOW: usize = 5;

/// Degraded-mode adapter used when a model family is disabled.
///
/// Extends the slope between the first and last of the final five values.
/// Gives no interval; in-sample predictions are the previous observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftAdapter;

impl ForecastModel for DriftAdapter {
    fn name(&self) -> &'static str {
        "Drift"
    }

    #[instrument(skip(self, series), fields(n = series.len()))]
    fn fit_and_forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ModelOutput> {
        let values = &series.values;
        if values.len() < 2 {
            return Err(ComputeError::Validation(format!(
                "Drift forecast needs at least two observations, got {}",
                values.len()
            )));
        }
        let last = values[values.len() - 1];

        let window = &values[values.len().saturating_sub(WINDOW)..];
        let slope = (last - window[0]) / (window.len() - 1) as f64;
        debug!(slope, "Drift slope over last {} values", window.len());

        Ok(ModelOutput {
            forecast: (1..=horizon).map(|k| last + slope * k as f64).collect(),
            lower: None,
            upper: None,
            future: series.axis.future_points(horizon),
            fitted: values[..values.len() - 1].to_vec(),
            fitted_offset: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeAxis;

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries {
            time_column: "t".into(),
            target_column: "y".into(),
            axis: TimeAxis::Labels((0..values.len()).map(|i| i.to_string()).collect()),
            values,
        }
    }

    #[test]
    fn test_extends_recent_slope() {
        let output = DriftAdapter.fit_and_forecast(&series(vec![0.0, 100.0, 1.0, 2.0, 3.0, 4.0, 5.0]), 3).unwrap();
        assert_eq!(output.forecast, vec![6.0, 7.0, 8.0]);
        assert!(output.lower.is_none());
        assert_eq!(output.fitted.len(), 6);
    }

    #[test]
    fn test_two_values_give_scoreable_fit() {
        let series = series(vec![3.0, 5.0]);
        let output = DriftAdapter.fit_and_forecast(&series, 2).unwrap();
        assert_eq!(output.forecast, vec![7.0, 9.0]);
        assert_eq!(output.fitted, vec![3.0]);
        assert_eq!(output.aligned_actuals(&series), &[5.0]);
    }

    #[test]
    fn test_single_value_is_rejected() {
        let err = DriftAdapter.fit_and_forecast(&series(vec![3.0]), 2).unwrap_err();
        assert!(matches!(err, ComputeError::Validation(ref msg) if msg.contains("at least two observations")));
    }

    #[test]
    fn test_empty_series_fails() {
        let err = DriftAdapter.fit_and_forecast(&series(vec![]), 2).unwrap_err();
        assert!(matches!(err, ComputeError::Validation(_)));
    }
}
