use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::services::schema_manager::{TableSearchHit, ValidationReport};

#[derive(Debug, Deserialize)]
pub struct SchemaSearchParams {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Serialize)]
pub struct SchemaListResponseDto {
    pub total_tables: usize,
    pub schemas: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SchemaSearchResponseDto {
    pub keyword: String,
    pub total_matches: usize,
    pub results: Vec<TableSearchHit>,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponseDto {
    pub valid: bool,
    pub issue_count: usize,
    #[serde(flatten)]
    pub report: ValidationReport,
}

impl From<ValidationReport> for ValidationResponseDto {
    fn from(report: ValidationReport) -> Self {
        Self {
            valid: report.is_valid(),
            issue_count: report.issue_count(),
            report,
        }
    }
}
