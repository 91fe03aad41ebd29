use anyhow::{bail, Context, Result};
use clap::Args;
use compute::default_registry;
use compute::models::ModelKind;
use compute::series::TimePoint;
use compute::session::{NoopObserver, RunOutcome, Session};
use compute::timestamps::format_timestamp;
use tracing::{debug, info, trace};

use crate::config::Settings;

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// CSV file with a header row
    #[arg(short, long)]
    pub file: String,

    /// Model family: arima or prophet
    #[arg(short, long, default_value = "arima")]
    pub model: ModelKind,

    /// Periods to forecast (default: forecast.default_horizon)
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Time column (default: first column named like a date or time)
    #[arg(short, long)]
    pub time_column: Option<String>,

    /// Target column (default: first numeric column)
    #[arg(long)]
    pub target_column: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, env = "FORECASTDASH_CONFIG")]
    pub config: Option<String>,
}

fn time_cell(point: &TimePoint) -> String {
    match point {
        TimePoint::Timestamp(ts) => format_timestamp(ts),
        TimePoint::Step(step) => step.to_string(),
    }
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

/// Runs one forecast outside the server and writes it to stdout as CSV.
pub fn forecast(args: ForecastArgs) -> Result<()> {
    trace!("Entering forecast command");
    let settings = Settings::load(args.config.as_deref())?;
    let registry = default_registry(Some(settings.models.capabilities()));
    let horizon = args.horizon.unwrap_or(settings.forecast.default_horizon);

    let bytes = std::fs::read(&args.file).with_context(|| format!("Failed to read {}", args.file))?;
    debug!("Read {} bytes from {}", bytes.len(), args.file);

    let mut session = Session::new(NoopObserver, settings.forecast.max_horizon);
    session.upload(&bytes)?;
    session.select(args.time_column, args.target_column);

    if let RunOutcome::Skipped(reason) = session.run(args.model, horizon, &registry)? {
        bail!("Forecast skipped: {reason}");
    }
    let Some(result) = session.state().latest_result() else {
        bail!("Forecast produced no result");
    };
    info!(
        "{} forecast of {} over {} periods using {}",
        result.model, result.target_column, result.horizon, result.adapter
    );

    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record([result.time_column.as_str(), "forecast", "lower", "upper"])?;
    for point in &result.forecast {
        writer.write_record([
            time_cell(&point.time),
            format!("{:.4}", point.value),
            optional_cell(point.lower),
            optional_cell(point.upper),
        ])?;
    }
    writer.flush()?;

    for (metric, value) in result.metrics.rows() {
        eprintln!("{metric}: {value}");
    }
    Ok(())
}
