//! REST API types for import clients.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{PipelineError, ServerError};
use crate::import::{ImportReport, RowOutcome};
use crate::models::{AssetId, AssetType, NormalizedRecord, SchemaKind};
use crate::store::StoredAsset;

/// Response sent after an import upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub job_id: String,

    pub kind: SchemaKind,

    /// Status: "ready", "warning", "error"
    pub status: String,

    pub total_rows: usize,

    pub successful_imports: usize,

    pub failed_imports: usize,

    /// `Row N: reason`, in row order
    pub errors: Vec<String>,

    /// Encoding the file was read with
    pub encoding: String,

    pub dry_run: bool,

    /// Outcome of every data row
    pub rows: Vec<RowReport>,
}

/// Outcome of one row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowReport {
    pub row: usize,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub record: Option<NormalizedRecord>,
}

impl From<&RowOutcome> for RowReport {
    fn from(outcome: &RowOutcome) -> Self {
        match outcome {
            RowOutcome::Accepted { row, record } => RowReport {
                row: *row,
                accepted: true,
                code: None,
                message: None,
                record: Some(record.clone()),
            },
            RowOutcome::Rejected { row, reason } => RowReport {
                row: *row,
                accepted: false,
                code: Some(reason.code().to_string()),
                message: Some(reason.to_string()),
                record: None,
            },
        }
    }
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        let errors = report.error_messages();
        let failed = report.batch.rejected_count() + report.persist_failures.len();
        let successful = if report.dry_run {
            report.batch.accepted_count()
        } else {
            report.persisted
        };

        let status = if failed == 0 {
            "ready"
        } else if successful > 0 {
            "warning"
        } else {
            "error"
        };

        ImportResponse {
            job_id: report.job_id,
            kind: report.batch.kind(),
            status: status.to_string(),
            total_rows: report.batch.total_rows(),
            successful_imports: successful,
            failed_imports: failed,
            errors,
            encoding: report.encoding.to_string(),
            dry_run: report.dry_run,
            rows: report.batch.outcomes().iter().map(RowReport::from).collect(),
        }
    }
}

/// Asset as listed by `GET /api/assets`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub id: AssetId,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub owner_id: u64,
    pub repair_count: usize,
}

impl AssetSummary {
    pub fn new(asset: &StoredAsset, repair_count: usize) -> Self {
        Self {
            id: asset.id,
            name: asset.name.clone(),
            asset_type: asset.asset_type,
            owner_id: asset.owner_id,
            repair_count,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "totalRows": 0,
        "successfulImports": 0,
        "failedImports": 0,
        "errors": [error],
    })
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Pipeline(PipelineError::Import(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(error_response(&self.to_string()))).into_response()
    }
}
