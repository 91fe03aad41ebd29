use std::f64::consts::PI;

use chrono::{Duration, NaiveDateTime};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, error, instrument, trace};

use super::numeric::ridge_solve;
use super::{ForecastModel, ModelOutput, Z_95};
use crate::error::{ComputeError, Result};
use crate::series::{TimePoint, TimeSeries};
use crate::timestamps::epoch_days;

/// Variance of the scaled observation noise assumed when turning the prior
/// scales into ridge penalties.
const NOISE_VARIANCE: f64 = 0.01;
/// Penalty on intercept and slope; keeps the normal equations invertible.
const TREND_PENALTY: f64 = 1e-8;

/// Settings of the additive trend and seasonality model.
#[derive(Debug, Clone, PartialEq)]
pub struct ProphetConfig {
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    /// Fourier order of the yearly component, 0 disables it
    pub yearly_order: usize,
    /// Fourier order of the weekly component, 0 disables it
    pub weekly_order: usize,
    /// Fourier order of the daily component, 0 disables it
    pub daily_order: usize,
}

impl Default for ProphetConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly_order: 10,
            weekly_order: 3,
            daily_order: 0,
        }
    }
}

/// Piecewise-linear trend plus Fourier seasonalities, forecasting daily steps.
#[derive(Debug, Clone, Default)]
pub struct ProphetAdapter {
    config: ProphetConfig,
}

impl ProphetAdapter {
    pub fn new(config: ProphetConfig) -> Self {
        Self { config }
    }
}

impl ForecastModel for ProphetAdapter {
    fn name(&self) -> &'static str {
        "Prophet"
    }

    #[instrument(skip(self, series), fields(n = series.len()))]
    fn fit_and_forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ModelOutput> {
        trace!("Entering ProphetAdapter::fit_and_forecast");
        let timestamps = series.timestamps()?;
        let fit = ProphetFit::fit(&self.config, timestamps, &series.values)?;

        let last = timestamps[timestamps.len() - 1];
        let future: Vec<NaiveDateTime> = (1..=horizon).map(|k| last + Duration::days(k as i64)).collect();
        let forecast = fit.predict(&future);
        let margin = Z_95 * fit.sigma;

        Ok(ModelOutput {
            lower: Some(forecast.iter().map(|v| v - margin).collect()),
            upper: Some(forecast.iter().map(|v| v + margin).collect()),
            forecast,
            future: future.into_iter().map(TimePoint::Timestamp).collect(),
            fitted: fit.fitted,
            fitted_offset: 0,
        })
    }
}

/// Fourier component with a period in days.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Seasonality {
    period: f64,
    order: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProphetFit {
    /// In-sample predictions, one per observation
    pub fitted: Vec<f64>,
    /// Residual standard deviation in data units
    pub sigma: f64,
    coefficients: Vec<f64>,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    start_days: f64,
    span_days: f64,
    y_scale: f64,
}

impl ProphetFit {
    pub fn fit(config: &ProphetConfig, timestamps: &[NaiveDateTime], values: &[f64]) -> Result<Self> {
        let n = values.len();
        if n < 2 || timestamps.len() != n {
            return Err(ComputeError::ModelFit(format!(
                "Prophet needs at least 2 observations, got {n}"
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ComputeError::ModelFit("series contains non-finite values".to_string()));
        }

        let days: Vec<f64> = timestamps.iter().map(epoch_days).collect();
        let start_days = days[0];
        let span_days = days[n - 1] - start_days;
        if span_days <= 0.0 {
            return Err(ComputeError::ModelFit(
                "Prophet needs observations at two or more distinct timestamps".to_string(),
            ));
        }

        let y_scale = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let scaled: Vec<f64> = values.iter().map(|v| v / y_scale).collect();
        let t: Vec<f64> = days.iter().map(|d| (d - start_days) / span_days).collect();

        let changepoints = place_changepoints(&t, config.n_changepoints, config.changepoint_range);
        let seasonalities: Vec<Seasonality> = [
            Seasonality { period: 365.25, order: config.yearly_order },
            Seasonality { period: 7.0, order: config.weekly_order },
            Seasonality { period: 1.0, order: config.daily_order },
        ]
        .into_iter()
        .filter(|s| s.order > 0)
        .collect();

        let mut model = Self {
            fitted: Vec::new(),
            sigma: 0.0,
            coefficients: Vec::new(),
            changepoints,
            seasonalities,
            start_days,
            span_days,
            y_scale,
        };

        let width = model.feature_count();
        let mut penalties = vec![TREND_PENALTY; 2];
        penalties.extend(
            std::iter::repeat(NOISE_VARIANCE / config.changepoint_prior_scale.powi(2))
                .take(model.changepoints.len()),
        );
        penalties.extend(
            std::iter::repeat(NOISE_VARIANCE / config.seasonality_prior_scale.powi(2))
                .take(width - 2 - model.changepoints.len()),
        );

        let rows: Vec<f64> = days.iter().flat_map(|day| model.features(*day)).collect();
        let design = DMatrix::from_row_slice(n, width, &rows);
        let target = DVector::from_vec(scaled);

        let coefficients = ridge_solve(&design, &target, &penalties).ok_or_else(|| {
            error!("Prophet normal equations are not positive definite");
            ComputeError::ModelFit("Prophet fit failed: normal equations are singular".to_string())
        })?;
        model.coefficients = coefficients.iter().copied().collect();

        model.fitted = days.iter().map(|d| model.predict_days(*d)).collect();
        if model.fitted.iter().any(|v| !v.is_finite()) {
            return Err(ComputeError::ModelFit("Prophet fit produced non-finite values".to_string()));
        }

        let sse: f64 = values.iter().zip(&model.fitted).map(|(y, f)| (y - f).powi(2)).sum();
        model.sigma = (sse / n as f64).sqrt();

        debug!(
            changepoints = model.changepoints.len(),
            features = width,
            sigma = model.sigma,
            "Prophet model fitted"
        );
        Ok(model)
    }

    pub fn predict(&self, timestamps: &[NaiveDateTime]) -> Vec<f64> {
        timestamps.iter().map(|ts| self.predict_days(epoch_days(ts))).collect()
    }

    fn predict_days(&self, day: f64) -> f64 {
        let row = self.features(day);
        let scaled: f64 = row.iter().zip(&self.coefficients).map(|(x, b)| x * b).sum();
        scaled * self.y_scale
    }

    fn feature_count(&self) -> usize {
        2 + self.changepoints.len() + self.seasonalities.iter().map(|s| 2 * s.order).sum::<usize>()
    }

    /// Design row: intercept, slope, changepoint hinges, then sin/cos pairs.
    fn features(&self, day: f64) -> Vec<f64> {
        let t = (day - self.start_days) / self.span_days;
        let mut row = Vec::with_capacity(self.feature_count());
        row.push(1.0);
        row.push(t);
        row.extend(self.changepoints.iter().map(|s| (t - s).max(0.0)));
        for season in &self.seasonalities {
            for k in 1..=season.order {
                let angle = 2.0 * PI * k as f64 * day / season.period;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }
        row
    }
}

/// Evenly spaced changepoints over the first `range` share of the history,
/// skipping the first observation.
fn place_changepoints(t: &[f64], requested: usize, range: f64) -> Vec<f64> {
    let history = (t.len() as f64 * range).floor() as usize;
    let count = requested.min(history.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }
    let last_index = (history - 1) as f64;
    (1..=count)
        .map(|i| {
            let index = (last_index * i as f64 / count as f64).round() as usize;
            t[index]
        })
        .collect()
}
