//! Domain models for the Repairlog ingestion pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`SchemaKind`] - Which record kind an upload declares (assets or repairs)
//! - [`NormalizedAsset`] / [`NormalizedRepair`] - Canonical records ready to persist
//! - [`AssetType`] / [`RepairStatus`] - Closed enums validated at import time
//! - [`Requester`] - The user on whose behalf an import runs
//! - [`AssetId`] - Resolved asset identifier

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Schema Kind
// =============================================================================

/// Record kind declared for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    #[serde(rename = "assets")]
    Asset,
    #[serde(rename = "repairs")]
    Repair,
}

impl SchemaKind {
    /// Parse the kind selector used in URLs and CLI arguments.
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector.trim().to_lowercase().as_str() {
            "assets" | "asset" => Some(Self::Asset),
            "repairs" | "repair" => Some(Self::Repair),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "assets",
            Self::Repair => "repairs",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_selector(s).ok_or_else(|| format!("unknown kind '{}' (expected assets or repairs)", s))
    }
}

// =============================================================================
// Asset Type
// =============================================================================

/// Category of an owned asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Property,
    Vehicle,
    Equipment,
    Other,
}

impl AssetType {
    /// Parse from the CSV value, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "PROPERTY" => Some(Self::Property),
            "VEHICLE" => Some(Self::Vehicle),
            "EQUIPMENT" => Some(Self::Equipment),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Property => "PROPERTY",
            Self::Vehicle => "VEHICLE",
            Self::Equipment => "EQUIPMENT",
            Self::Other => "OTHER",
        }
    }
}

// =============================================================================
// Repair Status
// =============================================================================

/// Lifecycle status of a repair event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    Planned,
    #[default]
    Completed,
}

impl RepairStatus {
    /// Parse from the CSV value. Exact, upper-case codes only.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PLANNED" => Some(Self::Planned),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Completed => "COMPLETED",
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Identifier of a stored asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role of the requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// The user on whose behalf an import runs.
///
/// Passed explicitly to every lookup; never read from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub user_id: u64,
    pub role: UserRole,
}

impl Requester {
    pub fn user(user_id: u64) -> Self {
        Self {
            user_id,
            role: UserRole::User,
        }
    }

    pub fn admin(user_id: u64) -> Self {
        Self {
            user_id,
            role: UserRole::Admin,
        }
    }

    /// Whether an asset owned by `owner_id` is visible to this requester.
    pub fn can_see(&self, owner_id: Option<u64>) -> bool {
        self.role == UserRole::Admin || owner_id == Some(self.user_id)
    }
}

// =============================================================================
// Normalized Records
// =============================================================================

/// An asset row that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAsset {
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
}

/// A repair row that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRepair {
    pub asset_reference: AssetId,
    pub date: NaiveDate,
    pub description: String,
    pub performed_by: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
    pub cost_minor_units: u64,
    #[serde(default)]
    pub status: RepairStatus,
}

/// Either kind of accepted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NormalizedRecord {
    Asset(NormalizedAsset),
    Repair(NormalizedRepair),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_kind_selector() {
        assert_eq!(SchemaKind::from_selector("assets"), Some(SchemaKind::Asset));
        assert_eq!(SchemaKind::from_selector("Repairs"), Some(SchemaKind::Repair));
        assert_eq!(SchemaKind::from_selector("invoices"), None);
        assert_eq!(SchemaKind::Repair.to_string(), "repairs");
    }

    #[test]
    fn test_asset_type_from_code() {
        assert_eq!(AssetType::from_code("PROPERTY"), Some(AssetType::Property));
        assert_eq!(AssetType::from_code(" vehicle "), Some(AssetType::Vehicle));
        assert_eq!(AssetType::from_code("boat"), None);
    }

    #[test]
    fn test_repair_status_default_and_roundtrip() {
        assert_eq!(RepairStatus::default(), RepairStatus::Completed);
        let code = RepairStatus::Planned.to_code();
        assert_eq!(RepairStatus::from_code(code), Some(RepairStatus::Planned));
        assert_eq!(RepairStatus::from_code("DONE"), None);
        assert_eq!(RepairStatus::from_code("planned"), None);
    }

    #[test]
    fn test_requester_visibility() {
        assert!(Requester::user(7).can_see(Some(7)));
        assert!(!Requester::user(7).can_see(Some(8)));
        assert!(!Requester::user(7).can_see(None));
        assert!(Requester::admin(1).can_see(Some(8)));
    }

    #[test]
    fn test_repair_serialization() {
        let repair = NormalizedRepair {
            asset_reference: AssetId::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: "Roof repair".into(),
            performed_by: "John Smith".into(),
            notes: None,
            cost_minor_units: 64336,
            status: RepairStatus::Completed,
        };
        let json = serde_json::to_value(&repair).unwrap();
        assert_eq!(json["date"], "2024-01-15");
        assert_eq!(json["costMinorUnits"], 64336);
        assert_eq!(json["status"], "COMPLETED");
        assert!(json.get("notes").is_none());
    }
}
