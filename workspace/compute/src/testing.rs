//! CSV fixtures shared by the unit tests.

use chrono::{Datelike, Duration, NaiveDate};

/// `date,value` with `rows` month starts from 2020-01, a trend and a yearly swing.
pub fn monthly_csv(rows: usize) -> String {
    let mut csv = String::from("date,value\n");
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    for i in 0..rows {
        let year = start.year() + (i / 12) as i32;
        let month = (i % 12) as u32 + 1;
        let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let value = 100.0 + 2.0 * i as f64 + 10.0 * ((i as f64) * std::f64::consts::PI / 6.0).sin();
        csv.push_str(&format!("{},{:.3}\n", date.format("%Y-%m-%d"), value));
    }
    csv
}

/// `date,value` with `rows` consecutive days from 2023-01-01 and a weekly pattern.
pub fn daily_csv(rows: usize) -> String {
    let mut csv = String::from("date,value\n");
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    for i in 0..rows {
        let date = start + Duration::days(i as i64);
        let weekday = date.weekday().num_days_from_monday() as f64;
        let noise = ((i * 7919) % 13) as f64 / 13.0;
        let value = 50.0 + 0.5 * i as f64 + 3.0 * weekday + noise;
        csv.push_str(&format!("{},{:.3}\n", date.format("%Y-%m-%d"), value));
    }
    csv
}

/// Initialize tracing for tests, writing to stderr at WARN unless RUST_LOG says otherwise.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::WARN);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}
