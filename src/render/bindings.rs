use common::{FigureDto, MetricRow, SummaryTable};
use compute::session::{SessionEvent, SessionObserver, SessionState};
use tracing::debug;

use super::{figures, tables};

/// Cached outputs of one session, re-rendered when their inputs change.
#[derive(Debug, Clone)]
pub struct RenderBindings {
    forecast_figure: FigureDto,
    metrics_table: Vec<MetricRow>,
    data_figure: FigureDto,
    summary: SummaryTable,
}

impl Default for RenderBindings {
    fn default() -> Self {
        Self {
            forecast_figure: figures::forecast_placeholder(),
            metrics_table: tables::metrics_placeholder(),
            data_figure: figures::data_visualization(None),
            summary: tables::summary_table(None),
        }
    }
}

impl RenderBindings {
    pub fn forecast_figure(&self) -> &FigureDto {
        &self.forecast_figure
    }

    pub fn metrics_table(&self) -> &[MetricRow] {
        &self.metrics_table
    }

    pub fn data_figure(&self) -> &FigureDto {
        &self.data_figure
    }

    pub fn summary(&self) -> &SummaryTable {
        &self.summary
    }
}

impl SessionObserver for RenderBindings {
    fn on_event(&mut self, event: &SessionEvent, state: &SessionState) {
        match event {
            SessionEvent::DatasetLoaded => {
                debug!("Re-rendering data outputs");
                self.data_figure = figures::data_visualization(state.dataset());
                self.summary = tables::summary_table(state.dataset());
            }
            SessionEvent::ForecastDisplayed => {
                if let Some(result) = state.latest_result() {
                    debug!("Re-rendering forecast outputs for {}", result.model);
                    self.forecast_figure = figures::forecast_figure(result);
                    self.metrics_table = tables::metrics_rows(result);
                }
            }
            SessionEvent::SelectionChanged
            | SessionEvent::ForecastStarted
            | SessionEvent::ForecastFailed(_) => {}
        }
    }
}
