use anyhow::Result;
use compute::default_registry;
use compute::models::Capabilities;
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Config file read when neither `--config` nor `FORECASTDASH_CONFIG` is set.
pub const DEFAULT_CONFIG_FILE: &str = "forecastdash.toml";
/// Prefix of environment overrides, e.g. `FORECASTDASH_FORECAST__MAX_HORIZON=50`.
pub const ENV_PREFIX: &str = "FORECASTDASH";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub max_sessions: u64,
    /// Sessions untouched for this long are dropped
    pub idle_timeout_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { max_sessions: 1000, idle_timeout_secs: 30 * 60 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastSettings {
    pub default_horizon: usize,
    pub max_horizon: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self { default_horizon: 12, max_horizon: 100 }
    }
}

/// Model families enabled in this deployment.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub arima: bool,
    pub prophet: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self { arima: true, prophet: true }
    }
}

impl ModelSettings {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities { arima: self.arima, prophet: self.prophet }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetSettings {
    pub template_path: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self { template_path: "assets/timeseries_demo.csv".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreviewSettings {
    pub default_rows: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self { default_rows: 100 }
    }
}

/// Application settings, layered from defaults, an optional file and the environment.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub sessions: SessionSettings,
    pub forecast: ForecastSettings,
    pub models: ModelSettings,
    pub assets: AssetSettings,
    pub preview: PreviewSettings,
}

impl Settings {
    /// Loads settings from `config_path` (or the default file, if present)
    /// with `FORECASTDASH_*` environment variables on top.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = config_path
            .map(str::to_string)
            .or_else(|| std::env::var(format!("{ENV_PREFIX}_CONFIG")).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        debug!("Loading configuration from {}", path);

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&path).required(config_path.is_some()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        Ok(settings)
    }
}

/// Initialize application state from settings
pub fn initialize_app_state(settings: Settings) -> AppState {
    info!(
        "Session store: up to {} sessions, idle timeout {}s",
        settings.sessions.max_sessions, settings.sessions.idle_timeout_secs
    );
    let sessions = Cache::builder()
        .max_capacity(settings.sessions.max_sessions)
        .time_to_idle(Duration::from_secs(settings.sessions.idle_timeout_secs))
        .build();

    let registry = default_registry(Some(settings.models.capabilities()));

    AppState {
        sessions,
        registry: Arc::new(registry),
        settings: Arc::new(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind_address, "0.0.0.0:3000");
        assert_eq!(settings.forecast.default_horizon, 12);
        assert_eq!(settings.forecast.max_horizon, 100);
        assert_eq!(settings.assets.template_path, "assets/timeseries_demo.csv");
        assert_eq!(settings.models.capabilities(), Capabilities::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = std::env::temp_dir().join(format!("forecastdash-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(&path, "[forecast]\nmax_horizon = 30\n\n[models]\nprophet = false\n").unwrap();

        let settings = Settings::load(path.to_str()).unwrap();
        assert_eq!(settings.forecast.max_horizon, 30);
        assert_eq!(settings.forecast.default_horizon, 12);
        assert!(!settings.models.prophet);
        assert!(settings.models.arima);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some("/nonexistent/forecastdash.toml")).is_err());
    }
}
