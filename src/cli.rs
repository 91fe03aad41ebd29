use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use commands::{forecast, serve, ForecastArgs};

#[derive(Parser)]
#[command(name = "forecastdash")]
#[command(about = "Time series forecasting dashboard server and CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Path to a TOML config file
        ///
        /// Defaults to forecastdash.toml in the working directory, if present.
        #[arg(short, long, env = "FORECASTDASH_CONFIG")]
        config: Option<String>,

        /// Bind address for the web server, overriding server.bind_address
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long, env = "BIND_ADDRESS")]
        bind_address: Option<String>,
    },
    /// Forecast a CSV file and print the result table
    ///
    /// Example:
    ///   forecastdash forecast --file sales.csv --model prophet --horizon 30
    Forecast(ForecastArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve { config, bind_address } => {
                serve(config.as_deref(), bind_address.as_deref()).await?;
            }
            Commands::Forecast(args) => {
                forecast(args)?;
            }
        }
        Ok(())
    }
}
