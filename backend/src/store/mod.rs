//! Asset Store - file-backed assets and repairs
//!
//! One JSON document per record under `<dir>/assets/` and `<dir>/repairs/`.
//! The store is also the [`AssetLookup`] the importer resolves names against.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::import::{AssetLookup, BatchResult};
use crate::models::{
    AssetId, AssetType, NormalizedAsset, NormalizedRecord, NormalizedRepair, RepairStatus,
    Requester,
};

const ASSETS_DIR: &str = "assets";
const REPAIRS_DIR: &str = "repairs";

/// A persisted asset with ownership metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    pub id: AssetId,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub owner_id: u64,
    pub created_at: DateTime<Utc>,
}

/// A persisted repair event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRepair {
    pub id: Uuid,
    pub asset_id: AssetId,
    pub date: NaiveDate,
    pub description: String,
    pub performed_by: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
    pub cost_minor_units: u64,
    pub status: RepairStatus,
    pub owner_id: u64,
    pub created_at: DateTime<Utc>,
}

/// Outcome of persisting the accepted rows of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistSummary {
    /// Records written.
    pub created: usize,
    /// `(row, message)` for accepted rows the store could not write.
    pub failures: Vec<(usize, String)>,
}

/// File-backed store for assets and repairs
pub struct AssetStore {
    dir: PathBuf,
    assets: HashMap<AssetId, StoredAsset>,
    repairs: HashMap<Uuid, StoredRepair>,
}

impl AssetStore {
    /// Open a store rooted at `dir`, creating it if needed and loading every record.
    ///
    /// Files that are not valid records are skipped.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(dir.join(ASSETS_DIR))?;
        fs::create_dir_all(dir.join(REPAIRS_DIR))?;

        let assets = load_records::<StoredAsset>(&dir.join(ASSETS_DIR))?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let repairs = load_records::<StoredRepair>(&dir.join(REPAIRS_DIR))?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        Ok(Self { dir, assets, repairs })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Assets visible to `requester`, ordered by name then creation time
    pub fn list_assets(&self, requester: &Requester) -> Vec<&StoredAsset> {
        let mut visible: Vec<_> = self
            .assets
            .values()
            .filter(|a| requester.can_see(Some(a.owner_id)))
            .collect();
        visible.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        visible
    }

    /// Get an asset by ID
    pub fn get_asset(&self, id: &AssetId) -> Option<&StoredAsset> {
        self.assets.get(id)
    }

    /// Store a new asset owned by `requester`
    pub fn create_asset(
        &mut self,
        asset: &NormalizedAsset,
        requester: &Requester,
    ) -> StoreResult<&StoredAsset> {
        let stored = StoredAsset {
            id: AssetId::new(),
            name: asset.name.clone(),
            asset_type: asset.asset_type,
            owner_id: requester.user_id,
            created_at: Utc::now(),
        };
        write_record(&self.dir.join(ASSETS_DIR), &stored.id.to_string(), &stored)?;

        let id = stored.id;
        Ok(self.assets.entry(id).or_insert(stored))
    }

    /// Store a repair against an existing asset
    pub fn create_repair(
        &mut self,
        repair: &NormalizedRepair,
        requester: &Requester,
    ) -> StoreResult<&StoredRepair> {
        if !self.assets.contains_key(&repair.asset_reference) {
            return Err(StoreError::MissingAsset(repair.asset_reference));
        }

        let stored = StoredRepair {
            id: Uuid::new_v4(),
            asset_id: repair.asset_reference,
            date: repair.date,
            description: repair.description.clone(),
            performed_by: repair.performed_by.clone(),
            notes: repair.notes.clone(),
            cost_minor_units: repair.cost_minor_units,
            status: repair.status,
            owner_id: requester.user_id,
            created_at: Utc::now(),
        };
        write_record(&self.dir.join(REPAIRS_DIR), &stored.id.to_string(), &stored)?;

        let id = stored.id;
        Ok(self.repairs.entry(id).or_insert(stored))
    }

    /// Repairs of one asset, oldest first
    pub fn repairs_for(&self, asset: &AssetId) -> Vec<&StoredRepair> {
        let mut repairs: Vec<_> = self
            .repairs
            .values()
            .filter(|r| r.asset_id == *asset)
            .collect();
        repairs.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        repairs
    }

    /// Write every accepted record of `batch`, in row order.
    ///
    /// A record that fails to write is reported and the rest continue.
    pub fn persist(&mut self, batch: &BatchResult, requester: &Requester) -> PersistSummary {
        let mut summary = PersistSummary::default();

        for (row, record) in batch.accepted() {
            let written = match record {
                NormalizedRecord::Asset(asset) => self.create_asset(asset, requester).map(|_| ()),
                NormalizedRecord::Repair(repair) => {
                    self.create_repair(repair, requester).map(|_| ())
                }
            };
            match written {
                Ok(()) => summary.created += 1,
                Err(e) => summary.failures.push((row, e.to_string())),
            }
        }

        summary
    }
}

impl AssetLookup for AssetStore {
    /// Oldest matching asset wins when a name is visible more than once.
    fn lookup_asset_by_name(&self, name: &str, requester: &Requester) -> Option<AssetId> {
        self.assets
            .values()
            .filter(|a| a.name == name && requester.can_see(Some(a.owner_id)))
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .map(|a| a.id)
    }
}

fn load_records<T: DeserializeOwned>(dir: &Path) -> StoreResult<Vec<T>> {
    let mut records = Vec::new();
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "json") {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(record) = serde_json::from_str::<T>(&content) {
                    records.push(record);
                }
            }
        }
    }
    Ok(records)
}

fn write_record<T: Serialize>(dir: &Path, id: &str, record: &T) -> StoreResult<()> {
    let path = dir.join(format!("{}.json", id));
    let content = serde_json::to_string_pretty(record)?;
    fs::write(&path, content)?;
    Ok(())
}
