pub mod dataset;
pub mod error;
pub mod metrics;
pub mod models;
pub mod series;
pub mod session;
pub mod stats;
pub mod timestamps;

#[cfg(test)]
mod testing;

use models::{Capabilities, ModelRegistry};

/// Returns the registry used most of the time: every model family enabled.
///
/// Pass `capabilities` to switch families off; disabled families are served
/// by the degraded drift forecast.
pub fn default_registry(capabilities: Option<Capabilities>) -> ModelRegistry {
    ModelRegistry::from_capabilities(capabilities.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::ModelKind;
    use session::{NoopObserver, RunOutcome, Session};
    use testing::monthly_csv;

    /// End to end: upload, run both model families, read the metrics rows.
    #[test]
    fn test_default_registry_runs_both_models() {
        let registry = default_registry(None);
        let mut session = Session::new(NoopObserver, 100);
        session.upload(monthly_csv(36).as_bytes()).unwrap();

        for kind in ModelKind::ALL {
            let outcome = session.run(kind, 8, &registry).unwrap();
            assert_eq!(outcome, RunOutcome::Completed);
            let result = session.state().latest_result().unwrap();
            assert_eq!(result.model, kind);
            assert_eq!(result.forecast.len(), 8);
            assert_eq!(result.metrics.rows().len(), 3);
        }
    }
}
