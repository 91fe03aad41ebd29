use nalgebra::{DMatrix, DVector};
use polars::prelude::*;
use tracing::{debug, instrument, warn};

use crate::dataset::Dataset;
use crate::models::numeric::ridge_solve;

/// Descriptive statistics of one numeric column, rounded to two decimals.
///
/// Quantiles interpolate linearly between order statistics, `std` is the
/// sample standard deviation, `skew` the adjusted Fisher-Pearson coefficient
/// and `kurtosis` the bias-corrected excess kurtosis. Statistics that are
/// undefined for the sample size are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub variable: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
    pub skew: Option<f64>,
    pub kurtosis: Option<f64>,
}

/// Header used for the summary table and its CSV download.
pub const SUMMARY_HEADER: [&str; 11] = [
    "variable", "count", "mean", "std", "min", "25%", "50%", "75%", "max", "skew", "kurtosis",
];

impl ColumnSummary {
    pub fn from_values(variable: &str, values: &[Option<f64>]) -> Self {
        let series = Series::new(variable.into(), values);
        Self::from_series(&series)
    }

    /// Aggregates of a numeric series; nulls are skipped.
    pub fn from_series(series: &Series) -> Self {
        let count = series.len() - series.null_count();
        let Ok(column) = series.cast(&DataType::Float64) else {
            warn!(column = %series.name(), "Column cannot be read as floats");
            return Self::undefined(series.name().as_str(), count);
        };
        let Ok(ca) = column.f64() else {
            return Self::undefined(series.name().as_str(), count);
        };

        let quantile = |q: f64| ca.quantile(q, QuantileMethod::Linear).ok().flatten();
        let std = ca.std(1).filter(|_| count > 1);
        // Constant columns have zero skew and kurtosis.
        let flat = std == Some(0.0);
        let skew = (count > 2)
            .then(|| if flat { Some(0.0) } else { column.skew(false).ok().flatten() })
            .flatten();
        let kurtosis = (count > 3)
            .then(|| if flat { Some(0.0) } else { column.kurtosis(true, false).ok().flatten() })
            .flatten();

        Self {
            variable: series.name().to_string(),
            count,
            mean: round2(ca.mean()),
            std: round2(std),
            min: round2(ca.min()),
            q25: round2(quantile(0.25)),
            median: round2(ca.median()),
            q75: round2(quantile(0.75)),
            max: round2(ca.max()),
            skew: round2(skew),
            kurtosis: round2(kurtosis),
        }
    }

    fn undefined(variable: &str, count: usize) -> Self {
        Self {
            variable: variable.to_string(),
            count,
            mean: None,
            std: None,
            min: None,
            q25: None,
            median: None,
            q75: None,
            max: None,
            skew: None,
            kurtosis: None,
        }
    }

    /// Cells in `SUMMARY_HEADER` order; undefined statistics render empty.
    pub fn cells(&self) -> Vec<String> {
        let fmt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        vec![
            self.variable.clone(),
            self.count.to_string(),
            fmt(self.mean),
            fmt(self.std),
            fmt(self.min),
            fmt(self.q25),
            fmt(self.median),
            fmt(self.q75),
            fmt(self.max),
            fmt(self.skew),
            fmt(self.kurtosis),
        ]
    }
}

/// Summary of every numeric column in dataset order.
#[instrument(skip(dataset), fields(columns = dataset.columns().len()))]
pub fn summarize(dataset: &Dataset) -> Vec<ColumnSummary> {
    let summaries: Vec<ColumnSummary> = dataset
        .numeric_columns()
        .into_iter()
        .filter_map(|c| c.numeric_values().map(|values| ColumnSummary::from_values(&c.name, values)))
        .collect();
    debug!("Summarized {} numeric columns", summaries.len());
    summaries
}

/// Least-squares line through `(x_i, y_i)`, returned as `(slope, intercept)`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len().min(y.len());
    if n < 2 || x[..n].iter().all(|v| *v == x[0]) {
        return None;
    }
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let target = DVector::from_column_slice(&y[..n]);
    let coefficients = ridge_solve(&design, &target, &[0.0, 0.0])?;
    Some((coefficients[1], coefficients[0]))
}

fn round2(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| (v * 100.0).round() / 100.0)
}
