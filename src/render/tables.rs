use common::{MetricRow, SummaryRow, SummaryTable};
use compute::dataset::Dataset;
use compute::session::ForecastResult;
use compute::stats::{self, ColumnSummary, SUMMARY_HEADER};

use super::{METRICS_PLACEHOLDER, NO_DATA_SUMMARY, NO_NUMERIC_SUMMARY};

/// Single-row table shown before any forecast has run.
pub fn metrics_placeholder() -> Vec<MetricRow> {
    vec![MetricRow { metric: "Note".to_string(), value: METRICS_PLACEHOLDER.to_string() }]
}

/// MAPE, RMSE and MAE rows of a completed run.
pub fn metrics_rows(result: &ForecastResult) -> Vec<MetricRow> {
    result
        .metrics
        .rows()
        .into_iter()
        .map(|(metric, value)| MetricRow { metric, value })
        .collect()
}

fn summary_row(summary: ColumnSummary) -> SummaryRow {
    SummaryRow {
        variable: summary.variable,
        count: summary.count,
        mean: summary.mean,
        std: summary.std,
        min: summary.min,
        q25: summary.q25,
        median: summary.median,
        q75: summary.q75,
        max: summary.max,
        skew: summary.skew,
        kurtosis: summary.kurtosis,
    }
}

pub fn summary_table(dataset: Option<&Dataset>) -> SummaryTable {
    let Some(dataset) = dataset else {
        return SummaryTable { rows: Vec::new(), note: Some(NO_DATA_SUMMARY.to_string()) };
    };
    let rows: Vec<SummaryRow> = stats::summarize(dataset).into_iter().map(summary_row).collect();
    if rows.is_empty() {
        return SummaryTable { rows, note: Some(NO_NUMERIC_SUMMARY.to_string()) };
    }
    SummaryTable { rows, note: None }
}

/// Summary statistics as CSV, one line per numeric column.
pub fn summary_csv(dataset: &Dataset) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SUMMARY_HEADER)?;
    for summary in stats::summarize(dataset) {
        writer.write_record(summary.cells())?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
