pub mod forecast;
pub mod serve;

pub use forecast::{forecast, ForecastArgs};
pub use serve::serve;
