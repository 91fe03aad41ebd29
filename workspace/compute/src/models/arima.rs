use anofox_forecast::core::TimeSeries as FitSeries;
use anofox_forecast::models::Forecaster;
use anofox_forecast::models::arima::ARIMA;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, instrument, trace};

use super::{ForecastModel, ModelOutput};
use crate::error::{ComputeError, Result};
use crate::series::TimeSeries;

/// Coverage of the returned prediction interval.
const INTERVAL_LEVEL: f64 = 0.95;

/// ARIMA(1,1,1) fitted with `anofox-forecast`.
///
/// The model only looks at the order of the observations, so the series is
/// handed over on a synthetic daily index.
#[derive(Debug, Clone)]
pub struct ArimaAdapter {
    interval_level: f64,
}

impl Default for ArimaAdapter {
    fn default() -> Self {
        Self { interval_level: INTERVAL_LEVEL }
    }
}

impl ArimaAdapter {
    pub fn new(interval_level: f64) -> Self {
        Self { interval_level }
    }
}

impl ForecastModel for ArimaAdapter {
    fn name(&self) -> &'static str {
        "ARIMA(1,1,1)"
    }

    #[instrument(skip(self, series), fields(n = series.len()))]
    fn fit_and_forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ModelOutput> {
        trace!("Entering ArimaAdapter::fit_and_forecast");
        check_series(&series.values)?;

        let index: Vec<DateTime<Utc>> = (0..series.len())
            .map(|i| DateTime::<Utc>::UNIX_EPOCH + Duration::days(i as i64))
            .collect();
        let fit_series = FitSeries::univariate(index, series.values.clone()).map_err(fit_error)?;

        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&fit_series).map_err(fit_error)?;
        debug!(
            ar = ?model.ar_coefficients(),
            ma = ?model.ma_coefficients(),
            aic = ?model.aic(),
            "ARIMA(1,1,1) fitted"
        );

        let prediction = model
            .predict_with_intervals(horizon, self.interval_level)
            .map_err(fit_error)?;
        let forecast = prediction.primary().to_vec();
        let lower = prediction.lower_series(0).map_err(fit_error)?.to_vec();
        let upper = prediction.upper_series(0).map_err(fit_error)?.to_vec();

        let (fitted, fitted_offset) = in_sample(model.fitted_values(), series.len())?;

        Ok(ModelOutput {
            forecast,
            lower: Some(lower),
            upper: Some(upper),
            future: series.axis.future_points(horizon),
            fitted,
            fitted_offset,
        })
    }
}

fn check_series(values: &[f64]) -> Result<()> {
    if values.len() < 3 {
        return Err(ComputeError::ModelFit(format!(
            "ARIMA(1,1,1) needs at least 3 observations, got {}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ComputeError::ModelFit("series contains non-finite values".to_string()));
    }

    let scale = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs())).max(1.0);
    if values.windows(2).all(|w| (w[1] - w[0]).abs() <= 1e-12 * scale) {
        error!("ARIMA fit rejected: series is constant");
        return Err(ComputeError::ModelFit(
            "series is constant, ARIMA(1,1,1) cannot be estimated".to_string(),
        ));
    }
    Ok(())
}

/// In-sample predictions without the leading entries lost to differencing,
/// together with the index of the first observation they line up with.
fn in_sample(fitted: Option<&[f64]>, n: usize) -> Result<(Vec<f64>, usize)> {
    let fitted = fitted.ok_or_else(|| ComputeError::ModelFit("ARIMA(1,1,1) produced no fitted values".to_string()))?;
    if fitted.len() > n {
        return Err(ComputeError::ModelFit(format!(
            "ARIMA(1,1,1) returned {} fitted values for {n} observations",
            fitted.len()
        )));
    }

    let leading = fitted.iter().take_while(|v| v.is_nan()).count();
    let kept = &fitted[leading..];
    if kept.is_empty() || kept.iter().any(|v| !v.is_finite()) {
        return Err(ComputeError::ModelFit("ARIMA(1,1,1) fitted values are not finite".to_string()));
    }
    Ok((kept.to_vec(), n - fitted.len() + leading))
}

fn fit_error(err: impl std::fmt::Display) -> ComputeError {
    error!("ARIMA(1,1,1) failed: {err}");
    ComputeError::ModelFit(format!("ARIMA(1,1,1) fit failed: {err}"))
}
