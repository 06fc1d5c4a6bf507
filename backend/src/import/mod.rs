//! Batch import of asset and repair CSV files.
//!
//! - [`batch`]: the pure importer, bytes in, [`BatchResult`] out
//! - [`validator`]: per-row checks for each record kind
//! - [`template`]: example files sharing the importer's header contract
//! - [`report`]: CSV rendering of rejected rows
//! - [`pipeline`]: resolve, import, persist and log, for the CLI and server
//!
//! Everything except [`pipeline`] is free of side effects.

pub mod batch;
pub mod pipeline;
pub mod report;
pub mod template;
pub mod validator;

use std::collections::HashMap;

use crate::models::{AssetId, Requester};

pub use batch::{import_batch, import_decoded, BatchResult, RawUpload, RowOutcome};
pub use pipeline::{run_import, ImportOptions, ImportReport};
pub use template::template_csv;
pub use validator::{columns, required_columns};

/// Read-only view of the assets that already exist.
///
/// Supplied by the caller as a snapshot; the importer never writes to it.
pub trait AssetLookup {
    /// Exact, case-sensitive name match among assets visible to `requester`.
    fn lookup_asset_by_name(&self, name: &str, requester: &Requester) -> Option<AssetId>;
}

/// A plain name -> id map, already scoped to one requester.
impl AssetLookup for HashMap<String, AssetId> {
    fn lookup_asset_by_name(&self, name: &str, _requester: &Requester) -> Option<AssetId> {
        self.get(name).copied()
    }
}

impl<T: AssetLookup + ?Sized> AssetLookup for &T {
    fn lookup_asset_by_name(&self, name: &str, requester: &Requester) -> Option<AssetId> {
        (**self).lookup_asset_by_name(name, requester)
    }
}
