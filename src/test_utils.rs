#[cfg(test)]
pub mod test_utils {
    use crate::config::{initialize_app_state, Settings};
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Monthly `date,value` CSV starting 2020-01-01: a linear trend plus a yearly cycle.
    pub fn monthly_csv(rows: usize) -> String {
        let mut csv = String::from("date,value\n");
        for i in 0..rows {
            let year = 2020 + i / 12;
            let month = i % 12 + 1;
            let value = 100.0 + 2.0 * i as f64 + 10.0 * (i as f64 * std::f64::consts::PI / 6.0).sin();
            csv.push_str(&format!("{year}-{month:02}-01,{value:.3}\n"));
        }
        csv
    }

    /// Create AppState for testing
    pub fn setup_test_app_state() -> AppState {
        initialize_app_state(Settings::default())
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub fn setup_test_app() -> Router {
        setup_test_app_with(Settings::default())
    }

    /// Create axum app for testing with custom settings
    pub fn setup_test_app_with(settings: Settings) -> Router {
        let _ = init_test_tracing();
        create_router(initialize_app_state(settings))
    }
}
