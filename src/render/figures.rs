use common::FigureDto;
use compute::dataset::{ColumnData, Dataset};
use compute::series::TimePoint;
use compute::session::ForecastResult;
use compute::stats::linear_fit;
use compute::timestamps::{format_timestamp, parse_timestamp};
use plotly::common::{DashType, Fill, Line, Mode, Title};
use plotly::layout::{Axis, Layout};
use plotly::{BoxPlot, Histogram, Plot, Scatter};
use serde_json::Value;
use tracing::{debug, error};

use super::{FORECAST_PLACEHOLDER, NO_DATA_VISUALIZATION, NO_NUMERIC_VISUALIZATION};

const ACTUAL_COLOR: &str = "rgb(31, 119, 180)";
const FORECAST_COLOR: &str = "rgb(214, 39, 40)";
const BAND_COLOR: &str = "rgba(214, 39, 40, 0.2)";
const TREND_COLOR: &str = "rgb(255, 127, 14)";
const PLOT_HEIGHT: usize = 500;

/// Statistics plot variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPlotKind {
    Boxplot,
    Histogram,
}

/// Serializes a figure into its Plotly JSON document.
fn to_figure(plot: &Plot, placeholder: Option<&str>) -> FigureDto {
    let figure = match serde_json::from_str::<Value>(&plot.to_json()) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to serialize plot: {}", e);
            Value::Null
        }
    };
    FigureDto { figure, placeholder: placeholder.map(str::to_string) }
}

/// Empty figure titled with a placeholder message.
pub fn placeholder_figure(message: &str) -> FigureDto {
    let mut plot = Plot::new();
    plot.set_layout(
        Layout::new()
            .title(Title::with_text(message))
            .height(PLOT_HEIGHT),
    );
    to_figure(&plot, Some(message))
}

pub fn forecast_placeholder() -> FigureDto {
    placeholder_figure(FORECAST_PLACEHOLDER)
}

fn time_value(point: &TimePoint) -> Value {
    match point {
        TimePoint::Timestamp(ts) => Value::String(format_timestamp(ts)),
        TimePoint::Step(step) => Value::from(*step),
    }
}

/// Actual history, forecast line and the shaded 95% band when bounds exist.
pub fn forecast_figure(result: &ForecastResult) -> FigureDto {
    let mut plot = Plot::new();

    let history_x: Vec<Value> = result.history.iter().map(|(t, _)| time_value(t)).collect();
    let history_y: Vec<f64> = result.history.iter().map(|(_, v)| *v).collect();
    plot.add_trace(
        Scatter::new(history_x, history_y)
            .mode(Mode::Lines)
            .name("Actual")
            .line(Line::new().color(ACTUAL_COLOR).width(2.0)),
    );

    let forecast_x: Vec<Value> = result.forecast.iter().map(|p| time_value(&p.time)).collect();
    let bounds: Option<(Vec<f64>, Vec<f64>)> = result
        .forecast
        .iter()
        .map(|p| Some((p.lower?, p.upper?)))
        .collect::<Option<Vec<_>>>()
        .map(|pairs| pairs.into_iter().unzip());

    if let Some((lower, upper)) = bounds {
        plot.add_trace(
            Scatter::new(forecast_x.clone(), upper)
                .mode(Mode::Lines)
                .name("Upper bound")
                .show_legend(false)
                .line(Line::new().color(BAND_COLOR).width(0.0)),
        );
        plot.add_trace(
            Scatter::new(forecast_x.clone(), lower)
                .mode(Mode::Lines)
                .name("95% Confidence Interval")
                .fill(Fill::ToNextY)
                .fill_color(BAND_COLOR)
                .line(Line::new().color(BAND_COLOR).width(0.0)),
        );
    }

    let forecast_y: Vec<f64> = result.forecast.iter().map(|p| p.value).collect();
    plot.add_trace(
        Scatter::new(forecast_x, forecast_y)
            .mode(Mode::Lines)
            .name("Forecast")
            .line(Line::new().color(FORECAST_COLOR).width(2.0)),
    );

    let title = format!(
        "{} Forecast for {} (Next {} periods)",
        result.model, result.target_column, result.horizon
    );
    plot.set_layout(
        Layout::new()
            .title(Title::with_text(&title))
            .x_axis(Axis::new().title(Title::with_text("Time")))
            .y_axis(Axis::new().title(Title::with_text(&result.target_column)))
            .height(PLOT_HEIGHT),
    );
    debug!("Rendered forecast figure: {}", title);
    to_figure(&plot, None)
}

/// First numeric column over time with a least-squares trend line.
///
/// The x axis is the first date/time-named column when its values parse as
/// timestamps, the row index otherwise.
pub fn data_visualization(dataset: Option<&Dataset>) -> FigureDto {
    let Some(dataset) = dataset else {
        return placeholder_figure(NO_DATA_VISUALIZATION);
    };
    let Some(column) = dataset.numeric_columns().into_iter().next() else {
        return placeholder_figure(NO_NUMERIC_VISUALIZATION);
    };
    let Some(values) = column.numeric_values() else {
        return placeholder_figure(NO_NUMERIC_VISUALIZATION);
    };

    let dates: Option<Vec<String>> = dataset.time_like_column().and_then(|time| match &time.data {
        ColumnData::Text(cells) => cells
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_timestamp).map(|ts| format_timestamp(&ts)))
            .collect(),
        ColumnData::Numeric(_) => None,
    });

    let points: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let x: Vec<Value> = points
        .iter()
        .map(|(i, _)| match &dates {
            Some(dates) => Value::String(dates[*i].clone()),
            None => Value::from(*i),
        })
        .collect();
    let y: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(x.clone(), y.clone())
            .mode(Mode::Lines)
            .name(column.name.as_str())
            .line(Line::new().color(ACTUAL_COLOR).width(2.0)),
    );

    let index: Vec<f64> = points.iter().map(|(i, _)| *i as f64).collect();
    if let Some((slope, intercept)) = linear_fit(&index, &y) {
        let trend: Vec<f64> = index.iter().map(|i| slope * i + intercept).collect();
        plot.add_trace(
            Scatter::new(x, trend)
                .mode(Mode::Lines)
                .name("Trend")
                .line(Line::new().color(TREND_COLOR).width(2.0).dash(DashType::Dash)),
        );
    }

    let x_title = if dates.is_some() {
        dataset.time_like_column().map(|c| c.name.clone()).unwrap_or_default()
    } else {
        "Index".to_string()
    };
    plot.set_layout(
        Layout::new()
            .title(Title::with_text(&format!("Time Series Plot of {}", column.name)))
            .x_axis(Axis::new().title(Title::with_text(&x_title)))
            .y_axis(Axis::new().title(Title::with_text(&column.name)))
            .height(PLOT_HEIGHT),
    );
    to_figure(&plot, None)
}

/// Distribution plot over every numeric column.
pub fn stats_visualization(dataset: Option<&Dataset>, kind: StatsPlotKind) -> FigureDto {
    let Some(dataset) = dataset else {
        return placeholder_figure(NO_DATA_VISUALIZATION);
    };
    let columns = dataset.numeric_columns();
    if columns.is_empty() {
        return placeholder_figure(NO_NUMERIC_VISUALIZATION);
    }

    let mut plot = Plot::new();
    for column in &columns {
        let values: Vec<f64> = column
            .numeric_values()
            .map(|values| values.iter().flatten().copied().collect())
            .unwrap_or_default();
        match kind {
            StatsPlotKind::Boxplot => plot.add_trace(BoxPlot::<f64, f64>::new(values).name(column.name.as_str())),
            StatsPlotKind::Histogram => {
                plot.add_trace(Histogram::new(values).name(column.name.as_str()).opacity(0.6))
            }
        }
    }

    let layout = match kind {
        StatsPlotKind::Boxplot => Layout::new()
            .title(Title::with_text("Boxplot of Numeric Variables"))
            .x_axis(Axis::new().title(Title::with_text("Variables")))
            .y_axis(Axis::new().title(Title::with_text("Values"))),
        StatsPlotKind::Histogram => {
            let title = match columns.as_slice() {
                [only] => format!("Histogram of {}", only.name),
                _ => "Histograms of Numeric Variables".to_string(),
            };
            Layout::new()
                .title(Title::with_text(&title))
                .x_axis(Axis::new().title(Title::with_text("Values")))
                .y_axis(Axis::new().title(Title::with_text("Count")))
        }
    };
    plot.set_layout(layout.height(PLOT_HEIGHT));
    to_figure(&plot, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute::models::ModelKind;
    use compute::metrics::Metrics;
    use compute::session::ForecastPoint;

    fn result(with_bounds: bool) -> ForecastResult {
        let forecast = (0..3)
            .map(|i| ForecastPoint {
                time: TimePoint::Step(5 + i),
                value: 10.0 + i as f64,
                lower: with_bounds.then_some(8.0),
                upper: with_bounds.then_some(12.0),
            })
            .collect();
        ForecastResult {
            model: ModelKind::Arima,
            adapter: "ARIMA(1,1,1)".into(),
            degraded: false,
            time_column: "t".into(),
            target_column: "sales".into(),
            horizon: 3,
            history: (0..5).map(|i| (TimePoint::Step(i), i as f64 + 1.0)).collect(),
            forecast,
            fitted: vec![1.0, 2.0, 3.0, 4.0],
            metrics: Metrics { mape: 1.0, rmse: 1.0, mae: 1.0 },
        }
    }

    fn trace_names(figure: &FigureDto) -> Vec<String> {
        figure.figure["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_forecast_figure_with_band() {
        let figure = forecast_figure(&result(true));
        assert_eq!(
            trace_names(&figure),
            vec!["Actual", "Upper bound", "95% Confidence Interval", "Forecast"]
        );
        let title = serde_json::to_string(&figure.figure["layout"]["title"]).unwrap();
        assert!(title.contains("ARIMA Forecast for sales (Next 3 periods)"));
        assert!(figure.placeholder.is_none());
    }

    #[test]
    fn test_forecast_figure_without_band() {
        let figure = forecast_figure(&result(false));
        assert_eq!(trace_names(&figure), vec!["Actual", "Forecast"]);
    }

    #[test]
    fn test_data_visualization_placeholders() {
        let figure = data_visualization(None);
        assert_eq!(figure.placeholder.as_deref(), Some(NO_DATA_VISUALIZATION));

        let dataset = Dataset::from_csv(b"date,label\n2021-01-01,a\n").unwrap();
        let figure = data_visualization(Some(&dataset));
        assert_eq!(figure.placeholder.as_deref(), Some(NO_NUMERIC_VISUALIZATION));
    }

    #[test]
    fn test_data_visualization_with_trend() {
        let dataset =
            Dataset::from_csv(b"date,value\n2021-01-01,1\n2021-01-02,3\n2021-01-03,5\n").unwrap();
        let figure = data_visualization(Some(&dataset));
        assert_eq!(trace_names(&figure), vec!["value", "Trend"]);
        assert_eq!(figure.figure["data"][0]["x"][0], "2021-01-01");
    }

    #[test]
    fn test_stats_visualization_traces() {
        let dataset = Dataset::from_csv(b"a,b,c\n1,2,x\n3,4,y\n").unwrap();
        let boxes = stats_visualization(Some(&dataset), StatsPlotKind::Boxplot);
        assert_eq!(trace_names(&boxes), vec!["a", "b"]);

        let histograms = stats_visualization(Some(&dataset), StatsPlotKind::Histogram);
        assert_eq!(trace_names(&histograms), vec!["a", "b"]);
    }
}
