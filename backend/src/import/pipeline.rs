//! High-level import API used by the CLI and the HTTP server.
//!
//! Combines every step: encoding resolution, batch import against the store,
//! persistence and progress logging.
//!
//! # Example
//!
//! ```rust,ignore
//! use repairlog::import::{run_import, ImportOptions};
//! use repairlog::models::{Requester, SchemaKind};
//! use repairlog::store::AssetStore;
//!
//! let mut store = AssetStore::open(".repairlog")?;
//! let bytes = std::fs::read("repairs.csv")?;
//! let report = run_import(&bytes, SchemaKind::Repair, &Requester::user(1), &mut store, ImportOptions::default())?;
//! println!("Imported {} repairs", report.persisted);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use super::batch::{import_decoded, BatchResult};
use crate::api::logs::JobLog;
use crate::error::{ImportError, PipelineResult};
use crate::models::{Requester, SchemaKind};
use crate::parser::resolve;
use crate::store::AssetStore;

/// Options for one import run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Validate only, write nothing
    pub dry_run: bool,

    /// How many rejections to list in the log
    pub max_logged_rejections: usize,

    /// Job identifier for log entries; generated when absent
    pub job_id: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_logged_rejections: 5,
            job_id: None,
        }
    }
}

/// Result of a complete import run
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub job_id: String,

    /// Per-row outcomes
    pub batch: BatchResult,

    /// Encoding the upload was decoded with
    pub encoding: &'static str,

    /// Records written to the store (0 on dry runs)
    pub persisted: usize,

    /// `(row, message)` for accepted rows that failed to persist
    pub persist_failures: Vec<(usize, String)>,

    pub dry_run: bool,

    pub duration_ms: u64,
}

impl ImportReport {
    /// Every row was accepted and persisted.
    pub fn is_clean(&self) -> bool {
        self.batch.rejected_count() == 0 && self.persist_failures.is_empty()
    }

    /// User-facing error lines: row rejections, then persistence failures.
    pub fn error_messages(&self) -> Vec<String> {
        let mut messages = self.batch.error_messages();
        messages.extend(
            self.persist_failures
                .iter()
                .map(|(row, message)| format!("Row {}: {}", row, message)),
        );
        messages
    }
}

/// Import `bytes` as records of `kind` on behalf of `requester`.
///
/// Steps:
/// 1. Resolve the encoding
/// 2. Validate rows against the store's current assets
/// 3. Persist accepted records, unless `dry_run`
/// 4. Summarise
pub fn run_import(
    bytes: &[u8],
    kind: SchemaKind,
    requester: &Requester,
    store: &mut AssetStore,
    options: ImportOptions,
) -> PipelineResult<ImportReport> {
    let started = Instant::now();
    let job_id = options
        .job_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let log = JobLog::new(job_id.clone());

    // Step 1: Encoding
    log.info(format!("📖 Reading {} upload ({} bytes)...", kind, bytes.len()));
    let decoded = match resolve(bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            log.error(format!("{} ({})", e, e.detail));
            return Err(ImportError::from(e).into());
        }
    };
    log.success(format!("Detected encoding: {}", decoded.encoding));
    if decoded.had_replacements {
        log.warning("Some characters could not be decoded and were replaced");
    }

    // Step 2: Validation
    log.info("🔍 Validating rows...");
    let batch = match import_decoded(&decoded, kind, &*store, requester) {
        Ok(batch) => batch,
        Err(e) => {
            if let ImportError::SchemaMismatch { missing, .. } = &e {
                log.error(format!("{} Missing columns: {}", e, missing.join(", ")));
            }
            return Err(e.into());
        }
    };
    log.success(format!(
        "{} rows: {} accepted, {} rejected",
        batch.total_rows(),
        batch.accepted_count(),
        batch.rejected_count()
    ));

    if batch.rejected_count() > 0 {
        log.warning(format!("{} rows rejected", batch.rejected_count()));
        for message in batch
            .error_messages()
            .iter()
            .take(options.max_logged_rejections)
        {
            log.detail(message.as_str());
        }
        if batch.rejected_count() > options.max_logged_rejections {
            log.detail(format!(
                "... and {} more",
                batch.rejected_count() - options.max_logged_rejections
            ));
        }
    }

    // Step 3: Persistence
    let (persisted, persist_failures) = if options.dry_run {
        log.info("Dry run, nothing written");
        (0, Vec::new())
    } else {
        let summary = store.persist(&batch, requester);
        if summary.failures.is_empty() {
            log.success(format!("💾 Saved {} {}", summary.created, kind));
        } else {
            log.error(format!(
                "💾 Saved {} {}, {} failed",
                summary.created,
                kind,
                summary.failures.len()
            ));
        }
        (summary.created, summary.failures)
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    log.info(format!("Done in {} ms", duration_ms));

    Ok(ImportReport {
        job_id,
        batch,
        encoding: decoded.encoding,
        persisted,
        persist_failures,
        dry_run: options.dry_run,
        duration_ms,
    })
}
