use common::{
    ColumnDto, ColumnKindDto, DatasetInfo, DatasetPreview, ForecastPointDto, ForecastResultDto, MetricsDto,
    ModelChoice, ModelInfo, SelectionDto, SessionInfo, TimePointDto,
};
use compute::dataset::{ColumnKind, Dataset};
use compute::models::{ModelDescription, ModelKind};
use compute::series::TimePoint;
use compute::session::{ForecastPoint, ForecastResult, Selection, SessionState};
use uuid::Uuid;

use crate::render::tables;

pub fn model_kind(choice: ModelChoice) -> ModelKind {
    match choice {
        ModelChoice::Arima => ModelKind::Arima,
        ModelChoice::Prophet => ModelKind::Prophet,
    }
}

pub fn model_choice(kind: ModelKind) -> ModelChoice {
    match kind {
        ModelKind::Arima => ModelChoice::Arima,
        ModelKind::Prophet => ModelChoice::Prophet,
    }
}

pub fn time_point(point: &TimePoint) -> TimePointDto {
    match point {
        TimePoint::Timestamp(ts) => TimePointDto::Timestamp(*ts),
        TimePoint::Step(step) => TimePointDto::Step(*step),
    }
}

fn forecast_point(point: &ForecastPoint) -> ForecastPointDto {
    ForecastPointDto {
        time: time_point(&point.time),
        value: point.value,
        lower: point.lower,
        upper: point.upper,
    }
}

pub fn selection(selection: &Selection) -> SelectionDto {
    SelectionDto {
        time_choices: selection.time_choices.clone(),
        target_choices: selection.target_choices.clone(),
        time_column: selection.time_column.clone(),
        target_column: selection.target_column.clone(),
    }
}

pub fn dataset_info(dataset: &Dataset, current: &Selection) -> DatasetInfo {
    let columns = dataset
        .columns()
        .iter()
        .map(|column| ColumnDto {
            name: column.name.clone(),
            kind: match column.kind() {
                ColumnKind::Numeric => ColumnKindDto::Numeric,
                ColumnKind::Text => ColumnKindDto::Text,
            },
        })
        .collect();
    DatasetInfo {
        rows: dataset.row_count(),
        columns,
        selection: selection(current),
    }
}

pub fn dataset_preview(dataset: &Dataset, offset: usize, limit: usize) -> DatasetPreview {
    DatasetPreview {
        columns: dataset.column_names(),
        rows: dataset.preview(offset, limit),
        offset,
        total_rows: dataset.row_count(),
    }
}

pub fn session_info(id: Uuid, state: &SessionState) -> SessionInfo {
    SessionInfo {
        id: id.to_string(),
        state: state.dispatch().to_string(),
        rows: state.dataset().map(Dataset::row_count),
        selection: selection(state.selection()),
        latest_model: state.latest_result().map(|result| model_choice(result.model)),
    }
}

pub fn forecast_result(result: &ForecastResult) -> ForecastResultDto {
    ForecastResultDto {
        model: model_choice(result.model),
        adapter: result.adapter.clone(),
        degraded: result.degraded,
        time_column: result.time_column.clone(),
        target_column: result.target_column.clone(),
        horizon: result.horizon,
        forecast: result.forecast.iter().map(forecast_point).collect(),
        metrics: MetricsDto {
            mape: result.metrics.mape,
            rmse: result.metrics.rmse,
            mae: result.metrics.mae,
        },
        metrics_table: tables::metrics_rows(result),
    }
}

pub fn model_info(description: ModelDescription) -> ModelInfo {
    ModelInfo {
        model: model_choice(description.kind),
        available: description.available,
        adapter: description.adapter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_choice_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(model_kind(model_choice(kind)), kind);
        }
    }

    #[test]
    fn test_dataset_info_kinds() {
        let dataset = Dataset::from_csv(b"date,value,label\n2021-01-01,1.5,a\n2021-01-02,2.5,b\n").unwrap();
        let info = dataset_info(&dataset, &Selection::default());
        assert_eq!(info.rows, 2);
        let kinds: Vec<ColumnKindDto> = info.columns.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ColumnKindDto::Text, ColumnKindDto::Numeric, ColumnKindDto::Text]);
    }

    #[test]
    fn test_preview_window() {
        let dataset = Dataset::from_csv(b"x\n1\n2\n3\n4\n").unwrap();
        let preview = dataset_preview(&dataset, 1, 2);
        assert_eq!(preview.total_rows, 4);
        assert_eq!(preview.rows, vec![vec![Some("2".to_string())], vec![Some("3".to_string())]]);
    }
}
