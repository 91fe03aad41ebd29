use thiserror::Error;
use tracing::error;

/// Error types for the compute module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// Uploaded bytes could not be turned into a dataset
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Input data is present but unusable for the requested operation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A forecast model could not be fitted
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Accuracy metrics are undefined for the given sequences
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Error from Polars DataFrame operations
    #[error("DataFrame error: {0}")]
    DataFrame(String),
}

impl From<polars::error::PolarsError> for ComputeError {
    fn from(error: polars::error::PolarsError) -> Self {
        let compute_error = match error {
            polars::error::PolarsError::NoData(_) => {
                let err = ComputeError::DataFrame(format!("No data: {}", error));
                error!(?err, "DataFrame error: No data");
                err
            }
            polars::error::PolarsError::SchemaMismatch(_) => {
                let err = ComputeError::DataFrame(format!("Schema mismatch: {}", error));
                error!(?err, "DataFrame error: Schema mismatch");
                err
            }
            polars::error::PolarsError::ComputeError(_) => {
                let err = ComputeError::DataFrame(format!("Compute error: {}", error));
                error!(?err, "DataFrame error: Compute error");
                err
            }
            polars::error::PolarsError::OutOfBounds(_) => {
                let err = ComputeError::DataFrame(format!("Out of bounds: {}", error));
                error!(?err, "DataFrame error: Out of bounds");
                err
            }
            _ => {
                let err = ComputeError::DataFrame(error.to_string());
                error!(?err, "DataFrame error");
                err
            }
        };
        compute_error
    }
}

impl ComputeError {
    /// Short machine-readable category, used as the API error code.
    pub fn code(&self) -> &'static str {
        match self {
            ComputeError::Ingestion(_) => "INGESTION_ERROR",
            ComputeError::Validation(_) => "VALIDATION_ERROR",
            ComputeError::ModelFit(_) => "MODEL_FIT_ERROR",
            ComputeError::Metrics(_) => "METRICS_ERROR",
            ComputeError::DataFrame(_) => "DATAFRAME_ERROR",
        }
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
