//! Error types for the Repairlog ingestion pipeline.
//!
//! This module defines the error hierarchy, from the innermost layer out:
//!
//! - [`DecodeError`] - no candidate encoding produced readable text
//! - [`NormalizeError`] - a date or money field could not be normalized
//! - [`RejectReason`] - why a single row was rejected (never fatal)
//! - [`ImportError`] - fatal batch errors (decode, header mismatch)
//! - [`StoreError`] - asset store I/O errors
//! - [`ConfigError`] - invalid environment settings
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::SchemaKind;

// =============================================================================
// Decoding Errors
// =============================================================================

/// The uploaded bytes could not be turned into text.
///
/// The display text is what the user sees; `detail` carries the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("file could not be read; check file encoding.")]
pub struct DecodeError {
    pub detail: String,
}

impl DecodeError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

// =============================================================================
// Field Normalization Errors
// =============================================================================

/// Errors from the date and currency normalizers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// No supported date pattern produced a valid calendar date.
    #[error("invalid date format '{0}' (supported: YYYY-MM-DD, DD.MM.YYYY, DD/MM/YYYY, DD-MM-YYYY, MM/DD/YYYY, YYYY.MM.DD)")]
    InvalidDateFormat(String),

    /// The money text is not a non-negative amount.
    #[error("invalid currency format '{value}': {message}")]
    InvalidCurrencyFormat {
        value: String,
        message: &'static str,
    },
}

// =============================================================================
// Row Rejections
// =============================================================================

/// Why a row was rejected. Local to one row, never aborts the batch.
///
/// The display text is returned verbatim to the user next to the row number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// A required column is blank in this row.
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// The referenced asset is not visible to the importing user.
    #[error("unknown asset")]
    UnknownAsset,

    /// Date or cost normalization failed.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Status outside the closed enum.
    #[error("invalid status value '{0}' (expected PLANNED or COMPLETED)")]
    InvalidStatus(String),

    /// Asset type outside the closed enum.
    #[error("invalid asset type '{0}' (expected PROPERTY, VEHICLE, EQUIPMENT or OTHER)")]
    InvalidAssetType(String),

    /// The importing user already owns an asset with this name.
    #[error("asset '{0}' already exists")]
    AssetExists(String),

    /// The same asset name appears on an earlier row of the file.
    #[error("duplicate asset name '{0}' in file")]
    DuplicateAsset(String),
}

impl RejectReason {
    /// Machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::UnknownAsset => "unknown_asset",
            Self::Normalize(NormalizeError::InvalidDateFormat(_)) => "invalid_date_format",
            Self::Normalize(NormalizeError::InvalidCurrencyFormat { .. }) => {
                "invalid_currency_format"
            }
            Self::InvalidStatus(_) => "invalid_status_value",
            Self::InvalidAssetType(_) => "invalid_asset_type",
            Self::AssetExists(_) => "asset_exists",
            Self::DuplicateAsset(_) => "duplicate_asset_name",
        }
    }
}

// =============================================================================
// Batch Import Errors
// =============================================================================

/// Fatal errors for a whole import call. Raised before any row is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// Undecodable input.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Header row lacks required columns for the declared kind.
    #[error("file does not match expected template for {kind}.")]
    SchemaMismatch {
        kind: SchemaKind,
        missing: Vec<String>,
    },
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the file-backed asset store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A repair references an asset that is not in the store.
    #[error("asset {0} no longer exists")]
    MissingAsset(crate::models::AssetId),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid environment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set but does not parse.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level import orchestration errors.
///
/// This is the error type returned by [`crate::import::pipeline::run_import`].
/// Store write failures are not fatal; they are reported per row in the
/// import report.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fatal import error.
    #[error(transparent)]
    Import(#[from] ImportError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unknown route parameter.
    #[error("Not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for normalizers.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // DecodeError -> ImportError -> PipelineError
        let import_err: ImportError = DecodeError::new("binary content").into();
        let pipeline_err: PipelineError = import_err.into();
        assert_eq!(
            pipeline_err.to_string(),
            "file could not be read; check file encoding."
        );

        // NormalizeError -> RejectReason
        let reason: RejectReason = NormalizeError::InvalidDateFormat("bad-date".into()).into();
        assert!(reason.to_string().contains("bad-date"));
        assert_eq!(reason.code(), "invalid_date_format");
    }

    #[test]
    fn test_schema_mismatch_message() {
        let err = ImportError::SchemaMismatch {
            kind: SchemaKind::Repair,
            missing: vec!["date".into()],
        };
        assert_eq!(
            err.to_string(),
            "file does not match expected template for repairs."
        );
    }

    #[test]
    fn test_reject_reason_text() {
        assert_eq!(RejectReason::UnknownAsset.to_string(), "unknown asset");
        assert_eq!(
            RejectReason::MissingField("description").to_string(),
            "missing field description"
        );
    }
}
