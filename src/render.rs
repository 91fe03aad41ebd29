pub mod bindings;
pub mod figures;
pub mod tables;

pub use bindings::RenderBindings;

pub const FORECAST_PLACEHOLDER: &str = "Upload data and click 'Run Forecast' to see results";
pub const METRICS_PLACEHOLDER: &str = "Run a forecast to see metrics";
pub const NO_DATA_VISUALIZATION: &str = "Upload data to see visualization";
pub const NO_NUMERIC_VISUALIZATION: &str = "No numeric columns found for visualization";
pub const NO_DATA_SUMMARY: &str = "Upload data to see summary statistics";
pub const NO_NUMERIC_SUMMARY: &str = "No numeric columns found in the data";
