use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SummaryRow {
    pub variable: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
    pub skew: Option<f64>,
    pub kurtosis: Option<f64>,
}

/// Summary statistics table, or a note explaining why it is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
    pub note: Option<String>,
}
