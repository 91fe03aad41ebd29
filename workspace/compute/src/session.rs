//! Per-session reactive state.
//!
//! A [`Session`] owns the uploaded dataset, the column selection, the forecast
//! dispatch state and the latest result. Every change is published to the
//! session's [`SessionObserver`], which is how outputs get re-rendered.

use std::fmt;

use tracing::{debug, error, info, instrument, trace, warn};

use crate::dataset::Dataset;
use crate::error::{ComputeError, Result};
use crate::metrics::Metrics;
use crate::models::{ModelKind, ModelRegistry};
use crate::series::{TimePoint, TimeSeries};

/// Dispatch state of the forecast run trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Running,
    Displayed,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchState::Idle => write!(f, "idle"),
            DispatchState::Running => write!(f, "running"),
            DispatchState::Displayed => write!(f, "displayed"),
        }
    }
}

/// State of the two column dropdowns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Every column of the dataset
    pub time_choices: Vec<String>,
    /// Numeric columns of the dataset
    pub target_choices: Vec<String>,
    pub time_column: Option<String>,
    pub target_column: Option<String>,
}

impl Selection {
    fn for_dataset(dataset: &Dataset) -> Self {
        Self {
            time_choices: dataset.column_names(),
            target_choices: dataset.numeric_column_names(),
            time_column: dataset.default_time_column().map(str::to_string),
            target_column: dataset.default_target_column().map(str::to_string),
        }
    }
}

/// One run of the forecast trigger. Built fresh per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub time_column: String,
    pub target_column: String,
    pub horizon: usize,
    pub model: ModelKind,
}

/// A forecast step with its optional 95% interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub time: TimePoint,
    pub value: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Everything the render bindings need from a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub model: ModelKind,
    /// Name of the adapter that produced the forecast
    pub adapter: String,
    /// True when a disabled model kind was served by the fallback adapter
    pub degraded: bool,
    pub time_column: String,
    pub target_column: String,
    pub horizon: usize,
    pub history: Vec<(TimePoint, f64)>,
    pub forecast: Vec<ForecastPoint>,
    pub fitted: Vec<f64>,
    pub metrics: Metrics,
}

/// Why a run trigger was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardReason {
    NoDataset,
    EmptyDataset,
    MissingTimeColumn(Option<String>),
    MissingTargetColumn(Option<String>),
    NonNumericTarget(String),
    NoCompleteRows,
    HorizonOutOfRange { horizon: usize, max: usize },
}

impl fmt::Display for GuardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardReason::NoDataset => write!(f, "no data has been uploaded"),
            GuardReason::EmptyDataset => write!(f, "the uploaded data has no rows"),
            GuardReason::MissingTimeColumn(Some(name)) => write!(f, "time column '{name}' is not in the data"),
            GuardReason::MissingTimeColumn(None) => write!(f, "no time column selected"),
            GuardReason::MissingTargetColumn(Some(name)) => write!(f, "target column '{name}' is not in the data"),
            GuardReason::MissingTargetColumn(None) => write!(f, "no target column selected"),
            GuardReason::NonNumericTarget(name) => write!(f, "target column '{name}' is not numeric"),
            GuardReason::NoCompleteRows => write!(f, "no rows have both a time and a target value"),
            GuardReason::HorizonOutOfRange { horizon, max } => {
                write!(f, "horizon {horizon} is outside 1..={max}")
            }
        }
    }
}

/// Outcome of a run trigger that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A new result is displayed
    Completed,
    /// The guard rejected the trigger; nothing changed
    Skipped(GuardReason),
}

/// State changes published to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DatasetLoaded,
    SelectionChanged,
    ForecastStarted,
    ForecastDisplayed,
    ForecastFailed(String),
}

/// Session data visible to observers.
#[derive(Debug, Clone)]
pub struct SessionState {
    dataset: Option<Dataset>,
    selection: Selection,
    dispatch: DispatchState,
    latest: Option<ForecastResult>,
    max_horizon: usize,
}

impl SessionState {
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn dispatch(&self) -> DispatchState {
        self.dispatch
    }

    pub fn latest_result(&self) -> Option<&ForecastResult> {
        self.latest.as_ref()
    }

    pub fn max_horizon(&self) -> usize {
        self.max_horizon
    }

    /// Checks that `request` can be dispatched against the current dataset.
    pub fn check_guard(&self, request: &ForecastRequest) -> std::result::Result<(), GuardReason> {
        let dataset = self.dataset.as_ref().ok_or(GuardReason::NoDataset)?;
        if dataset.row_count() == 0 {
            return Err(GuardReason::EmptyDataset);
        }
        if !dataset.has_column(&request.time_column) {
            return Err(GuardReason::MissingTimeColumn(Some(request.time_column.clone())));
        }
        let target = dataset
            .column(&request.target_column)
            .ok_or_else(|| GuardReason::MissingTargetColumn(Some(request.target_column.clone())))?;
        let values = target
            .numeric_values()
            .ok_or_else(|| GuardReason::NonNumericTarget(request.target_column.clone()))?;
        if request.horizon < 1 || request.horizon > self.max_horizon {
            return Err(GuardReason::HorizonOutOfRange { horizon: request.horizon, max: self.max_horizon });
        }

        let time = dataset
            .column(&request.time_column)
            .ok_or_else(|| GuardReason::MissingTimeColumn(Some(request.time_column.clone())))?;
        let complete = (0..dataset.row_count())
            .any(|row| values[row].is_some() && time.data.display(row).is_some());
        if !complete {
            return Err(GuardReason::NoCompleteRows);
        }
        Ok(())
    }
}

/// Receives every state change of a session, in order.
pub trait SessionObserver: Send {
    fn on_event(&mut self, event: &SessionEvent, state: &SessionState);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_event(&mut self, _event: &SessionEvent, _state: &SessionState) {}
}

impl<A: SessionObserver, B: SessionObserver> SessionObserver for (A, B) {
    fn on_event(&mut self, event: &SessionEvent, state: &SessionState) {
        self.0.on_event(event, state);
        self.1.on_event(event, state);
    }
}

/// Per-user reactive session.
pub struct Session<O: SessionObserver = NoopObserver> {
    state: SessionState,
    observer: O,
}

impl<O: SessionObserver> fmt::Debug for Session<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("dispatch", &self.state.dispatch)
            .field("rows", &self.state.dataset.as_ref().map(Dataset::row_count))
            .finish()
    }
}

impl<O: SessionObserver> Session<O> {
    /// Creates an empty session that accepts horizons up to `max_horizon`.
    pub fn new(observer: O, max_horizon: usize) -> Self {
        Self {
            state: SessionState {
                dataset: None,
                selection: Selection::default(),
                dispatch: DispatchState::Idle,
                latest: None,
                max_horizon,
            },
            observer,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    fn publish(&mut self, event: SessionEvent) {
        trace!(?event, "Publishing session event");
        self.observer.on_event(&event, &self.state);
    }

    /// Replaces the dataset with parsed CSV bytes and resets the selection.
    ///
    /// On failure the session is left as it was.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn upload(&mut self, bytes: &[u8]) -> Result<&Dataset> {
        let dataset = Dataset::from_csv(bytes)?;
        self.replace_dataset(dataset);
        self.state
            .dataset
            .as_ref()
            .ok_or_else(|| ComputeError::Ingestion("dataset was not stored".to_string()))
    }

    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.state.selection = Selection::for_dataset(&dataset);
        info!(
            rows = dataset.row_count(),
            time_column = ?self.state.selection.time_column,
            target_column = ?self.state.selection.target_column,
            "Dataset replaced"
        );
        self.state.dataset = Some(dataset);
        self.publish(SessionEvent::DatasetLoaded);
    }

    /// Updates the selected columns. `None` keeps the current choice.
    pub fn select(&mut self, time_column: Option<String>, target_column: Option<String>) {
        let mut changed = false;
        if let Some(time) = time_column {
            if self.state.selection.time_column.as_deref() != Some(time.as_str()) {
                self.state.selection.time_column = Some(time);
                changed = true;
            }
        }
        if let Some(target) = target_column {
            if self.state.selection.target_column.as_deref() != Some(target.as_str()) {
                self.state.selection.target_column = Some(target);
                changed = true;
            }
        }
        if changed {
            debug!(selection = ?self.state.selection, "Selection changed");
            self.publish(SessionEvent::SelectionChanged);
        }
    }

    /// Builds a request from the current selection.
    pub fn request_for(&self, model: ModelKind, horizon: usize) -> std::result::Result<ForecastRequest, GuardReason> {
        let selection = &self.state.selection;
        let time_column = selection
            .time_column
            .clone()
            .ok_or(GuardReason::MissingTimeColumn(None))?;
        let target_column = selection
            .target_column
            .clone()
            .ok_or(GuardReason::MissingTargetColumn(None))?;
        Ok(ForecastRequest { time_column, target_column, horizon, model })
    }

    /// Runs the forecast trigger with the current selection.
    pub fn run(&mut self, model: ModelKind, horizon: usize, registry: &ModelRegistry) -> Result<RunOutcome> {
        if self.state.dataset.is_none() {
            warn!("Forecast skipped: {}", GuardReason::NoDataset);
            return Ok(RunOutcome::Skipped(GuardReason::NoDataset));
        }
        match self.request_for(model, horizon) {
            Ok(request) => self.run_forecast(request, registry),
            Err(reason) => {
                warn!("Forecast skipped: {}", reason);
                Ok(RunOutcome::Skipped(reason))
            }
        }
    }

    /// Dispatches `request` to the adapter for its model kind.
    ///
    /// A rejected guard changes nothing. A failed fit restores the previous
    /// dispatch state and keeps any result already displayed.
    #[instrument(skip(self, registry), fields(model = %request.model, horizon = request.horizon))]
    pub fn run_forecast(&mut self, request: ForecastRequest, registry: &ModelRegistry) -> Result<RunOutcome> {
        trace!("Entering Session::run_forecast");
        if let Err(reason) = self.state.check_guard(&request) {
            warn!("Forecast skipped: {}", reason);
            return Ok(RunOutcome::Skipped(reason));
        }

        let previous = self.state.dispatch;
        self.state.dispatch = DispatchState::Running;
        info!("Forecast dispatch {} -> {}", previous, DispatchState::Running);
        self.publish(SessionEvent::ForecastStarted);

        match self.compute(&request, registry) {
            Ok(result) => {
                self.state.latest = Some(result);
                self.state.dispatch = DispatchState::Displayed;
                info!("Forecast dispatch {} -> {}", DispatchState::Running, DispatchState::Displayed);
                self.publish(SessionEvent::ForecastDisplayed);
                Ok(RunOutcome::Completed)
            }
            Err(err) => {
                error!("Forecast failed: {}", err);
                self.state.dispatch = previous;
                self.publish(SessionEvent::ForecastFailed(err.to_string()));
                Err(err)
            }
        }
    }

    fn compute(&self, request: &ForecastRequest, registry: &ModelRegistry) -> Result<ForecastResult> {
        let dataset = self
            .state
            .dataset
            .as_ref()
            .ok_or_else(|| ComputeError::Validation(GuardReason::NoDataset.to_string()))?;
        let series = TimeSeries::from_dataset(dataset, &request.time_column, &request.target_column)?;

        let adapter = registry.adapter(request.model);
        let degraded = registry.is_degraded(request.model);
        if degraded {
            warn!("{} unavailable, serving degraded {} forecast", request.model, adapter.name());
        }

        let output = adapter.fit_and_forecast(&series, request.horizon)?;
        if output.forecast.len() != request.horizon || output.future.len() != request.horizon {
            return Err(ComputeError::ModelFit(format!(
                "{} returned {} points for horizon {}",
                adapter.name(),
                output.forecast.len(),
                request.horizon
            )));
        }

        let metrics = Metrics::calculate(output.aligned_actuals(&series), &output.fitted)?;

        let forecast = output
            .future
            .iter()
            .zip(&output.forecast)
            .enumerate()
            .map(|(i, (time, value))| ForecastPoint {
                time: *time,
                value: *value,
                lower: output.lower.as_ref().and_then(|l| l.get(i).copied()),
                upper: output.upper.as_ref().and_then(|u| u.get(i).copied()),
            })
            .collect();

        let history = series.axis.points().into_iter().zip(series.values.iter().copied()).collect();

        Ok(ForecastResult {
            model: request.model,
            adapter: adapter.name().to_string(),
            degraded,
            time_column: request.time_column.clone(),
            target_column: request.target_column.clone(),
            horizon: request.horizon,
            history,
            forecast,
            fitted: output.fitted,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Capabilities;
    use crate::testing::{daily_csv, init_test_tracing, monthly_csv};

    /// Records every event with the dispatch state at that moment.
    #[derive(Default)]
    struct Recorder {
        events: Vec<(SessionEvent, DispatchState)>,
    }

    impl SessionObserver for Recorder {
        fn on_event(&mut self, event: &SessionEvent, state: &SessionState) {
            self.events.push((event.clone(), state.dispatch()));
        }
    }

    fn session() -> Session<Recorder> {
        Session::new(Recorder::default(), 100)
    }

    #[test]
    fn test_upload_populates_selection() {
        let _guard = init_test_tracing();
        let mut session = session();
        session.upload(monthly_csv(24).as_bytes()).unwrap();

        let selection = session.state().selection();
        assert_eq!(selection.time_choices, vec!["date", "value"]);
        assert_eq!(selection.target_choices, vec!["value"]);
        assert_eq!(selection.time_column.as_deref(), Some("date"));
        assert_eq!(selection.target_column.as_deref(), Some("value"));
        assert_eq!(session.observer().events, vec![(SessionEvent::DatasetLoaded, DispatchState::Idle)]);
    }

    #[test]
    fn test_failed_upload_keeps_previous_dataset() {
        let mut session = session();
        session.upload(monthly_csv(5).as_bytes()).unwrap();
        assert!(session.upload(b"").is_err());
        assert_eq!(session.state().dataset().unwrap().row_count(), 5);
        assert_eq!(session.observer().events.len(), 1);
    }

    #[test]
    fn test_monthly_arima_run() {
        let _guard = init_test_tracing();
        let registry = ModelRegistry::default();
        let mut session = session();
        session.upload(monthly_csv(24).as_bytes()).unwrap();

        let outcome = session.run(ModelKind::Arima, 12, &registry).unwrap();
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(session.state().dispatch(), DispatchState::Displayed);

        let result = session.state().latest_result().unwrap();
        assert_eq!(result.forecast.len(), 12);
        assert_eq!(result.metrics.rows().len(), 3);
        assert_eq!(result.history.len(), 24);
        assert!(!result.degraded);

        let events: Vec<_> = session.observer().events.iter().map(|(e, s)| (e.clone(), *s)).collect();
        assert_eq!(
            events,
            vec![
                (SessionEvent::DatasetLoaded, DispatchState::Idle),
                (SessionEvent::ForecastStarted, DispatchState::Running),
                (SessionEvent::ForecastDisplayed, DispatchState::Displayed),
            ]
        );
    }

    #[test]
    fn test_prophet_future_dates_after_last() {
        let registry = ModelRegistry::default();
        let mut session = session();
        session.upload(daily_csv(40).as_bytes()).unwrap();
        session.run(ModelKind::Prophet, 5, &registry).unwrap();

        let result = session.state().latest_result().unwrap();
        let last = match result.history.last().unwrap().0 {
            TimePoint::Timestamp(ts) => ts,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(result.forecast.len(), 5);
        for (k, point) in result.forecast.iter().enumerate() {
            assert_eq!(point.time, TimePoint::Timestamp(last + chrono::Duration::days(k as i64 + 1)));
            assert!(point.lower.is_some() && point.upper.is_some());
        }
    }

    #[test]
    fn test_rerun_overwrites_result() {
        let registry = ModelRegistry::default();
        let mut session = session();
        session.upload(monthly_csv(24).as_bytes()).unwrap();
        session.run(ModelKind::Arima, 12, &registry).unwrap();
        session.run(ModelKind::Prophet, 3, &registry).unwrap();

        let result = session.state().latest_result().unwrap();
        assert_eq!(result.model, ModelKind::Prophet);
        assert_eq!(result.forecast.len(), 3);
    }

    #[test]
    fn test_run_without_data_is_noop() {
        let registry = ModelRegistry::default();
        let mut session = session();

        let outcome = session.run(ModelKind::Arima, 12, &registry).unwrap();
        assert_eq!(outcome, RunOutcome::Skipped(GuardReason::NoDataset));
        assert_eq!(session.state().dispatch(), DispatchState::Idle);
        assert!(session.observer().events.is_empty());
    }

    #[test]
    fn test_empty_dataset_is_noop() {
        let registry = ModelRegistry::default();
        let mut session = session();
        session.upload(b"date,value\n").unwrap();

        let outcome = session.run(ModelKind::Arima, 12, &registry).unwrap();
        assert_eq!(outcome, RunOutcome::Skipped(GuardReason::EmptyDataset));
        assert!(session.state().latest_result().is_none());
        assert_eq!(session.observer().events.len(), 1);
    }

    #[test]
    fn test_missing_target_is_noop() {
        let registry = ModelRegistry::default();
        let mut session = session();
        session.upload(monthly_csv(24).as_bytes()).unwrap();
        session.select(None, Some("revenue".to_string()));

        let outcome = session.run(ModelKind::Prophet, 5, &registry).unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Skipped(GuardReason::MissingTargetColumn(Some("revenue".to_string())))
        );
        assert_eq!(session.state().dispatch(), DispatchState::Idle);
        assert_eq!(
            session.observer().events.last().map(|(e, _)| e.clone()),
            Some(SessionEvent::SelectionChanged)
        );
    }

    #[test]
    fn test_horizon_bounds() {
        let registry = ModelRegistry::default();
        let mut session = session();
        session.upload(monthly_csv(24).as_bytes()).unwrap();

        assert_eq!(
            session.run(ModelKind::Arima, 0, &registry).unwrap(),
            RunOutcome::Skipped(GuardReason::HorizonOutOfRange { horizon: 0, max: 100 })
        );
        assert!(matches!(
            session.run(ModelKind::Arima, 101, &registry).unwrap(),
            RunOutcome::Skipped(GuardReason::HorizonOutOfRange { .. })
        ));
    }

    #[test]
    fn test_failed_fit_restores_previous_state() {
        let registry = ModelRegistry::default();
        let mut session = session();
        session.upload(monthly_csv(24).as_bytes()).unwrap();
        session.run(ModelKind::Arima, 6, &registry).unwrap();

        // Constant series cannot be fitted
        session.upload(b"date,value\n2021-01-01,5\n2021-01-02,5\n2021-01-03,5\n2021-01-04,5\n").unwrap();
        let err = session.run(ModelKind::Arima, 6, &registry).unwrap_err();
        assert!(matches!(err, ComputeError::ModelFit(_)));
        assert_eq!(session.state().dispatch(), DispatchState::Displayed);
        assert_eq!(session.state().latest_result().unwrap().horizon, 6);
        assert!(matches!(
            session.observer().events.last(),
            Some((SessionEvent::ForecastFailed(_), DispatchState::Displayed))
        ));
    }

    #[test]
    fn test_zero_actuals_fail_metrics() {
        let registry = ModelRegistry::default();
        let mut session = session();
        session.upload(b"date,value\n2021-01-01,0\n2021-01-02,1\n2021-01-03,0\n2021-01-04,3\n2021-01-05,2\n").unwrap();

        let err = session.run(ModelKind::Arima, 2, &registry).unwrap_err();
        assert!(matches!(err, ComputeError::Metrics(_)));
        assert_eq!(session.state().dispatch(), DispatchState::Idle);
    }

    #[test]
    fn test_degraded_registry_serves_drift() {
        let registry = ModelRegistry::from_capabilities(Capabilities { arima: false, prophet: true });
        let mut session = session();
        session.upload(monthly_csv(24).as_bytes()).unwrap();
        session.run(ModelKind::Arima, 4, &registry).unwrap();

        let result = session.state().latest_result().unwrap();
        assert!(result.degraded);
        assert_eq!(result.adapter, "Drift");
        assert_eq!(result.forecast.len(), 4);
        assert!(result.forecast[0].lower.is_none());
    }
}
