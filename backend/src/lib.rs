//! # Repairlog - maintenance and repair records with bulk CSV import
//!
//! Repairlog keeps a register of owned assets (properties, vehicles,
//! equipment) and the repairs done on them. Spreadsheets exported from other
//! tools are imported in bulk, whatever their text encoding.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV bytes  │────▶│   Parser    │────▶│   Import    │────▶│    Store    │
//! │ (any enc.)  │     │ (encoding,  │     │ (validate,  │     │ (JSON docs) │
//! │             │     │  rows)      │     │  normalize) │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use repairlog::{import_batch, RawUpload, Requester, SchemaKind};
//!
//! let assets = HashMap::new();
//! let csv = "name;type\nHouse on Main Street;PROPERTY\n";
//! let result = import_batch(RawUpload::new(csv.as_bytes(), SchemaKind::Asset), &assets, &Requester::user(1))?;
//! println!("{} accepted, {} rejected", result.accepted_count(), result.rejected_count());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (records, enums, requester)
//! - [`parser`] - Encoding resolution and row splitting
//! - [`normalize`] - Date and currency normalizers
//! - [`import`] - Batch importer, templates, pipeline
//! - [`store`] - File-backed asset store
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;
pub mod normalize;

// Import
pub mod import;

// Persistence
pub mod store;

pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    DecodeError,
    ImportError,
    NormalizeError,
    PipelineError,
    RejectReason,
    ServerError,
    StoreError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AssetId,
    AssetType,
    NormalizedAsset,
    NormalizedRecord,
    NormalizedRepair,
    RepairStatus,
    Requester,
    SchemaKind,
    UserRole,
};

// =============================================================================
// Re-exports - Parsing and normalization
// =============================================================================

pub use parser::{resolve, DecodedText};
pub use normalize::{parse_cost_minor_units, parse_date};

// =============================================================================
// Re-exports - Import
// =============================================================================

pub use import::{
    import_batch,
    run_import,
    template_csv,
    AssetLookup,
    BatchResult,
    ImportOptions,
    ImportReport,
    RawUpload,
    RowOutcome,
};

// =============================================================================
// Re-exports - Store and config
// =============================================================================

pub use store::{AssetStore, PersistSummary, StoredAsset, StoredRepair};
pub use config::AppConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
