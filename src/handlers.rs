pub mod datasets;
pub mod forecasts;
pub mod health;
pub mod models;
pub mod sessions;
pub mod summary;
pub mod templates;
