use std::cmp::Ordering;
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, instrument};

use crate::dataset::{ColumnData, Dataset, format_number};
use crate::error::{ComputeError, Result};
use crate::timestamps::{self, format_timestamp};

/// Position of an observation or forecast on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimePoint {
    Timestamp(NaiveDateTime),
    /// Row position after sorting; forecast steps continue past the last row.
    Step(usize),
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePoint::Timestamp(ts) => write!(f, "{}", format_timestamp(ts)),
            TimePoint::Step(step) => write!(f, "{}", step),
        }
    }
}

/// Time axis of a prepared series.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    /// Every time value coerced to a timestamp.
    Timestamps(Vec<NaiveDateTime>),
    /// Time values kept as their original labels, plotted by position.
    Labels(Vec<String>),
}

impl TimeAxis {
    pub fn len(&self) -> usize {
        match self {
            TimeAxis::Timestamps(values) => values.len(),
            TimeAxis::Labels(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> Vec<TimePoint> {
        match self {
            TimeAxis::Timestamps(values) => values.iter().copied().map(TimePoint::Timestamp).collect(),
            TimeAxis::Labels(values) => (0..values.len()).map(TimePoint::Step).collect(),
        }
    }

    /// `horizon` points after the last observation: daily steps for timestamps,
    /// positional steps otherwise.
    pub fn future_points(&self, horizon: usize) -> Vec<TimePoint> {
        match self {
            TimeAxis::Timestamps(values) => match values.last() {
                Some(last) => (1..=horizon)
                    .map(|k| TimePoint::Timestamp(*last + Duration::days(k as i64)))
                    .collect(),
                None => Vec::new(),
            },
            TimeAxis::Labels(values) => (values.len()..values.len() + horizon).map(TimePoint::Step).collect(),
        }
    }
}

/// A (time, target) pair drawn from a dataset, complete and sorted by time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub time_column: String,
    pub target_column: String,
    pub axis: TimeAxis,
    pub values: Vec<f64>,
}

/// Sort key for one row of the time column.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum TimeKey {
    Timestamp(NaiveDateTime),
    Number(f64),
    Label(String),
}

impl TimeSeries {
    /// Selects `time_column` and `target_column`, drops rows missing either
    /// value and stable-sorts ascending by time.
    ///
    /// A text time column is ordered chronologically when every value parses
    /// as a timestamp, lexicographically otherwise.
    #[instrument(skip(dataset))]
    pub fn from_dataset(dataset: &Dataset, time_column: &str, target_column: &str) -> Result<Self> {
        let time = dataset
            .column(time_column)
            .ok_or_else(|| ComputeError::Validation(format!("time column '{time_column}' not found")))?;
        let target = dataset
            .column(target_column)
            .ok_or_else(|| ComputeError::Validation(format!("target column '{target_column}' not found")))?;
        let values = target
            .numeric_values()
            .ok_or_else(|| ComputeError::Validation(format!("target column '{target_column}' is not numeric")))?;

        let keyed = match &time.data {
            ColumnData::Numeric(times) => times
                .iter()
                .zip(values)
                .filter_map(|(t, v)| Some((TimeKey::Number((*t)?), format_number((*t)?), (*v)?)))
                .collect::<Vec<_>>(),
            ColumnData::Text(times) => {
                let complete: Vec<(&str, f64)> = times
                    .iter()
                    .zip(values)
                    .filter_map(|(t, v)| Some((t.as_deref()?, (*v)?)))
                    .collect();
                match timestamps::parse_all(complete.iter().map(|(t, _)| *t)) {
                    Some(parsed) if !parsed.is_empty() => parsed
                        .into_iter()
                        .zip(complete)
                        .map(|(ts, (label, v))| (TimeKey::Timestamp(ts), label.to_string(), v))
                        .collect(),
                    _ => complete
                        .into_iter()
                        .map(|(label, v)| (TimeKey::Label(label.to_string()), label.to_string(), v))
                        .collect(),
                }
            }
        };

        let dropped = dataset.row_count() - keyed.len();
        if dropped > 0 {
            debug!("Dropped {} rows with missing time or target values", dropped);
        }

        let mut keyed = keyed;
        keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let values = keyed.iter().map(|(_, _, v)| *v).collect();
        let axis = if keyed.iter().all(|(key, _, _)| matches!(key, TimeKey::Timestamp(_))) && !keyed.is_empty() {
            TimeAxis::Timestamps(
                keyed
                    .iter()
                    .filter_map(|(key, _, _)| match key {
                        TimeKey::Timestamp(ts) => Some(*ts),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            TimeAxis::Labels(keyed.into_iter().map(|(_, label, _)| label).collect())
        };

        Ok(Self {
            time_column: time_column.to_string(),
            target_column: target_column.to_string(),
            axis,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamps of the axis, or a validation error when they are labels.
    pub fn timestamps(&self) -> Result<&[NaiveDateTime]> {
        match &self.axis {
            TimeAxis::Timestamps(values) => Ok(values),
            TimeAxis::Labels(_) => Err(ComputeError::Validation(format!(
                "time column '{}' could not be converted to timestamps",
                self.time_column
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::monthly_csv;

    fn shuffled_monthly() -> Dataset {
        let csv = monthly_csv(6);
        let mut lines: Vec<&str> = csv.lines().collect();
        let header = lines.remove(0);
        lines.reverse();
        lines.swap(0, 3);
        let body = std::iter::once(header).chain(lines).collect::<Vec<_>>().join("\n");
        Dataset::from_csv(body.as_bytes()).unwrap()
    }

    #[test]
    fn test_sorts_by_parsed_timestamps() {
        let dataset = shuffled_monthly();
        let series = TimeSeries::from_dataset(&dataset, "date", "value").unwrap();

        let stamps = series.timestamps().unwrap();
        assert_eq!(stamps.len(), 6);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let dataset = shuffled_monthly();
        let once = TimeSeries::from_dataset(&dataset, "date", "value").unwrap();

        let mut csv = String::from("date,value\n");
        for (point, value) in once.axis.points().iter().zip(&once.values) {
            csv.push_str(&format!("{},{}\n", point, value));
        }
        let resorted = Dataset::from_csv(csv.as_bytes()).unwrap();
        let twice = TimeSeries::from_dataset(&resorted, "date", "value").unwrap();

        assert_eq!(once.axis, twice.axis);
        assert_eq!(once.values, twice.values);
    }

    #[test]
    fn test_numeric_time_column_sorts_numerically() {
        let csv = "t,y\n10,1\n2,2\n33,3\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        let series = TimeSeries::from_dataset(&dataset, "t", "y").unwrap();

        assert_eq!(series.values, vec![2.0, 1.0, 3.0]);
        assert_eq!(series.axis, TimeAxis::Labels(vec!["2".into(), "10".into(), "33".into()]));
        assert!(series.timestamps().is_err());
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let csv = "period,y\nb,1\na,2\nb,3\na,4\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        let series = TimeSeries::from_dataset(&dataset, "period", "y").unwrap();
        assert_eq!(series.values, vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn test_drops_incomplete_rows() {
        let csv = "date,value\n2021-01-01,1\n,2\n2021-01-03,\n2021-01-04,4\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        let series = TimeSeries::from_dataset(&dataset, "date", "value").unwrap();
        assert_eq!(series.values, vec![1.0, 4.0]);
    }

    #[test]
    fn test_future_points() {
        let dataset = Dataset::from_csv(monthly_csv(3).as_bytes()).unwrap();
        let series = TimeSeries::from_dataset(&dataset, "date", "value").unwrap();
        let future = series.axis.future_points(2);
        assert_eq!(future[0].to_string(), "2020-03-02");
        assert_eq!(future[1].to_string(), "2020-03-03");

        let labels = TimeAxis::Labels(vec!["a".into(), "b".into()]);
        assert_eq!(labels.future_points(2), vec![TimePoint::Step(2), TimePoint::Step(3)]);
    }

    #[test]
    fn test_rejects_text_target() {
        let csv = "date,label\n2021-01-01,a\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        let err = TimeSeries::from_dataset(&dataset, "date", "label").unwrap_err();
        assert!(matches!(err, ComputeError::Validation(_)));
    }
}
