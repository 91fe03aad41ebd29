use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKindDto {
    Numeric,
    Text,
}

/// Column name and kind, in file order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ColumnDto {
    pub name: String,
    pub kind: ColumnKindDto,
}

/// Dropdown choices and the current choice for each.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SelectionDto {
    /// Every column, offered for the time dropdown
    pub time_choices: Vec<String>,
    /// Numeric columns, offered for the target dropdown
    pub target_choices: Vec<String>,
    pub time_column: Option<String>,
    pub target_column: Option<String>,
}

/// Request body for changing the selected columns. Omitted fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UpdateSelectionRequest {
    pub time_column: Option<String>,
    pub target_column: Option<String>,
}

/// Shape of an uploaded dataset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DatasetInfo {
    pub rows: usize,
    pub columns: Vec<ColumnDto>,
    pub selection: SelectionDto,
}

/// A window of dataset rows rendered as text.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DatasetPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub offset: usize,
    pub total_rows: usize,
}
