use std::collections::HashSet;
use std::io::Cursor;

use polars::prelude::*;
use tracing::{debug, error, info, instrument, trace};

use crate::error::{ComputeError, Result};

/// Number of rows polars looks at when inferring column types.
const SCHEMA_INFERENCE_ROWS: usize = 1000;

/// Kind of values a column holds, mirroring the two dropdown filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// Values of a single column; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell rendered as text, for previews and time labels.
    pub fn display(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Numeric(values) => values.get(row).copied().flatten().map(format_number),
            ColumnData::Text(values) => values.get(row).cloned().flatten(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self.data {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    pub fn numeric_values(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }
}

/// Tabular data from one upload. Column names are unique and keep file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Builds a dataset from already-typed columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.data.len()).unwrap_or(0);

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ComputeError::Ingestion(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
            if column.data.len() != rows {
                return Err(ComputeError::Ingestion(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.data.len(),
                    rows
                )));
            }
        }

        Ok(Self { columns, rows })
    }

    /// Reads CSV bytes with a header row.
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        trace!("Entering Dataset::from_csv");

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            error!("Rejected upload: file is empty");
            return Err(ComputeError::Ingestion("uploaded file is empty".to_string()));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(SCHEMA_INFERENCE_ROWS))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| {
                error!("Failed to parse CSV: {}", e);
                ComputeError::Ingestion(format!("could not parse CSV: {e}"))
            })?;

        let dataset = Self::from_dataframe(&df)?;
        info!(
            "Loaded dataset with {} rows and {} columns",
            dataset.row_count(),
            dataset.columns.len()
        );
        Ok(dataset)
    }

    /// Converts a polars frame, treating integer and float dtypes as numeric.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let height = df.height();
        let mut columns = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let name = column.name().to_string();
            let data = if is_numeric_dtype(column.dtype()) {
                let mut values = Vec::with_capacity(height);
                for i in 0..height {
                    let value = match column.get(i)? {
                        AnyValue::Null => None,
                        other => Some(other.try_extract::<f64>()?).filter(|v| !v.is_nan()),
                    };
                    values.push(value);
                }
                ColumnData::Numeric(values)
            } else {
                let mut values = Vec::with_capacity(height);
                for i in 0..height {
                    let value = match column.get(i)? {
                        AnyValue::Null => None,
                        AnyValue::String(s) => Some(s.to_string()),
                        AnyValue::StringOwned(s) => Some(s.to_string()),
                        other => Some(other.to_string()),
                    };
                    values.push(value);
                }
                ColumnData::Text(values)
            };
            debug!("Column '{}' ingested as {:?}", name, data_kind(&data));
            columns.push(Column { name, data });
        }

        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Numeric)
            .collect()
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.numeric_columns().iter().map(|c| c.name.clone()).collect()
    }

    /// First column whose name mentions a date or time, else the first column.
    pub fn default_time_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| is_time_like_name(&c.name))
            .or_else(|| self.columns.first())
            .map(|c| c.name.as_str())
    }

    /// First column whose name mentions a date or time, without fallback.
    pub fn time_like_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| is_time_like_name(&c.name))
    }

    /// First numeric column.
    pub fn default_target_column(&self) -> Option<&str> {
        self.numeric_columns().first().map(|c| c.name.as_str())
    }

    /// A window of rows rendered as text cells.
    pub fn preview(&self, offset: usize, limit: usize) -> Vec<Vec<Option<String>>> {
        let end = offset.saturating_add(limit).min(self.rows);
        (offset.min(end)..end)
            .map(|row| self.columns.iter().map(|c| c.data.display(row)).collect())
            .collect()
    }
}

pub fn is_time_like_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("date") || lower.contains("time")
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn data_kind(data: &ColumnData) -> ColumnKind {
    match data {
        ColumnData::Numeric(_) => ColumnKind::Numeric,
        ColumnData::Text(_) => ColumnKind::Text,
    }
}

/// Integral values print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::monthly_csv;

    #[test]
    fn test_from_csv_infers_kinds() {
        let dataset = Dataset::from_csv(monthly_csv(24).as_bytes()).unwrap();

        assert_eq!(dataset.row_count(), 24);
        assert_eq!(dataset.column_names(), vec!["date", "value"]);
        assert_eq!(dataset.column("date").unwrap().kind(), ColumnKind::Text);
        assert_eq!(dataset.column("value").unwrap().kind(), ColumnKind::Numeric);
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        let err = Dataset::from_csv(b"").unwrap_err();
        assert!(matches!(err, ComputeError::Ingestion(_)));

        let err = Dataset::from_csv(b"  \n ").unwrap_err();
        assert!(matches!(err, ComputeError::Ingestion(_)));
    }

    #[test]
    fn test_header_only_upload_has_no_rows() {
        let dataset = Dataset::from_csv(b"date,value\n").unwrap();
        assert_eq!(dataset.row_count(), 0);
        assert_eq!(dataset.column_names(), vec!["date", "value"]);
    }

    #[test]
    fn test_default_columns() {
        let csv = "id,sales,timestamp,region\n1,10.5,2021-01-01,north\n2,11.0,2021-01-02,south\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();

        assert_eq!(dataset.default_time_column(), Some("timestamp"));
        assert_eq!(dataset.default_target_column(), Some("id"));
        assert_eq!(dataset.numeric_column_names(), vec!["id", "sales"]);
    }

    #[test]
    fn test_default_time_column_falls_back_to_first() {
        let csv = "period,amount\na,1\nb,2\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.default_time_column(), Some("period"));
        assert_eq!(dataset.default_target_column(), Some("amount"));
    }

    #[test]
    fn test_no_numeric_columns() {
        let csv = "date,label\n2021-01-01,a\n2021-01-02,b\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.default_target_column(), None);
        assert!(dataset.numeric_columns().is_empty());
    }

    #[test]
    fn test_missing_cells_become_none() {
        let csv = "date,value\n2021-01-01,1.5\n2021-01-02,\n2021-01-03,3\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        let values = dataset.column("value").unwrap().numeric_values().unwrap();
        assert_eq!(values, &[Some(1.5), None, Some(3.0)]);
    }

    #[test]
    fn test_preview_window() {
        let dataset = Dataset::from_csv(monthly_csv(10).as_bytes()).unwrap();

        let rows = dataset.preview(8, 5);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].as_deref(), Some("2020-09-01"));

        assert!(dataset.preview(50, 5).is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let columns = vec![
            Column { name: "a".into(), data: ColumnData::Numeric(vec![Some(1.0)]) },
            Column { name: "a".into(), data: ColumnData::Numeric(vec![Some(2.0)]) },
        ];
        assert!(matches!(Dataset::new(columns), Err(ComputeError::Ingestion(_))));
    }
}
