//! Per-row validation.
//!
//! Each function takes one [`RowRecord`] and either builds the normalized
//! record or names the first problem found. Rows are all-or-nothing.

use std::collections::HashSet;

use super::AssetLookup;
use crate::error::RejectReason;
use crate::models::{
    AssetType, NormalizedAsset, NormalizedRepair, RepairStatus, Requester, SchemaKind,
};
use crate::normalize::{parse_cost_minor_units, parse_date};
use crate::parser::RowRecord;

/// Column names shared by the importer and the template files.
pub mod columns {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";

    pub const ASSET_NAME: &str = "asset_name";
    pub const DATE: &str = "date";
    pub const DESCRIPTION: &str = "description";
    pub const PERFORMED_BY: &str = "performed_by";
    pub const NOTES: &str = "notes";
    pub const COST_CENTS: &str = "cost_cents";
    pub const STATUS: &str = "status";

    /// Full asset header, template order.
    pub const ASSET_HEADER: &[&str] = &[NAME, TYPE];

    /// Full repair header, template order.
    pub const REPAIR_HEADER: &[&str] = &[
        ASSET_NAME,
        DATE,
        DESCRIPTION,
        PERFORMED_BY,
        NOTES,
        COST_CENTS,
        STATUS,
    ];
}

use columns::*;

/// Columns a header must contain for the given kind.
pub fn required_columns(kind: SchemaKind) -> &'static [&'static str] {
    match kind {
        SchemaKind::Asset => &[NAME, TYPE],
        SchemaKind::Repair => &[ASSET_NAME, DATE, DESCRIPTION, PERFORMED_BY],
    }
}

fn required<'r>(row: &'r RowRecord, column: &'static str) -> Result<&'r str, RejectReason> {
    row.non_blank(column).ok_or(RejectReason::MissingField(column))
}

/// Validate an asset row.
///
/// `seen` holds names accepted earlier in the same file; an accepted name is
/// added to it.
pub fn validate_asset_row<L: AssetLookup + ?Sized>(
    row: &RowRecord,
    lookup: &L,
    requester: &Requester,
    seen: &mut HashSet<String>,
) -> Result<NormalizedAsset, RejectReason> {
    let name = required(row, NAME)?;
    let type_code = required(row, TYPE)?;

    let asset_type = AssetType::from_code(type_code)
        .ok_or_else(|| RejectReason::InvalidAssetType(type_code.to_string()))?;

    if lookup.lookup_asset_by_name(name, requester).is_some() {
        return Err(RejectReason::AssetExists(name.to_string()));
    }
    if seen.contains(name) {
        return Err(RejectReason::DuplicateAsset(name.to_string()));
    }

    seen.insert(name.to_string());
    Ok(NormalizedAsset {
        name: name.to_string(),
        asset_type,
    })
}

/// Validate a repair row.
///
/// The asset reference is resolved right after `asset_name` is read, before
/// the other required fields, so a row naming a missing asset always reports
/// `unknown asset`.
pub fn validate_repair_row<L: AssetLookup + ?Sized>(
    row: &RowRecord,
    lookup: &L,
    requester: &Requester,
) -> Result<NormalizedRepair, RejectReason> {
    let asset_name = required(row, ASSET_NAME)?;
    let asset_reference = lookup
        .lookup_asset_by_name(asset_name, requester)
        .ok_or(RejectReason::UnknownAsset)?;

    let date_text = required(row, DATE)?;
    let description = required(row, DESCRIPTION)?;
    let performed_by = required(row, PERFORMED_BY)?;

    let date = parse_date(date_text)?;
    let cost_minor_units = match row.non_blank(COST_CENTS) {
        Some(cost) => parse_cost_minor_units(cost)?,
        None => 0,
    };

    let status = match row.non_blank(STATUS) {
        Some(code) => RepairStatus::from_code(code)
            .ok_or_else(|| RejectReason::InvalidStatus(code.to_string()))?,
        None => RepairStatus::default(),
    };

    Ok(NormalizedRepair {
        asset_reference,
        date,
        description: description.to_string(),
        performed_by: performed_by.to_string(),
        notes: row.non_blank(NOTES).map(str::to_string),
        cost_minor_units,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizeError;
    use crate::models::AssetId;
    use crate::parser::HeaderMap;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn repair_row(line: &str) -> RowRecord {
        HeaderMap::parse(&REPAIR_HEADER.join(";")).record(line, 2)
    }

    fn asset_row(line: &str) -> RowRecord {
        HeaderMap::parse("name;type").record(line, 2)
    }

    fn lookup() -> (HashMap<String, AssetId>, AssetId) {
        let house = AssetId::new();
        (HashMap::from([("House".to_string(), house)]), house)
    }

    #[test]
    fn test_valid_repair() {
        let (assets, house) = lookup();
        let row = repair_row("House;15.01.2024;Roof repair;John Smith;Fixed leak;$643.36;PLANNED");
        let repair = validate_repair_row(&row, &assets, &Requester::user(1)).unwrap();

        assert_eq!(repair.asset_reference, house);
        assert_eq!(repair.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(repair.notes.as_deref(), Some("Fixed leak"));
        assert_eq!(repair.cost_minor_units, 64336);
        assert_eq!(repair.status, RepairStatus::Planned);
    }

    #[test]
    fn test_repair_defaults() {
        let (assets, _) = lookup();
        let row = repair_row("House;2024-01-15;Inspection;Me;;;");
        let repair = validate_repair_row(&row, &assets, &Requester::user(1)).unwrap();

        assert_eq!(repair.notes, None);
        assert_eq!(repair.cost_minor_units, 0);
        assert_eq!(repair.status, RepairStatus::Completed);
    }

    #[test]
    fn test_unknown_asset_checked_before_other_fields() {
        let (assets, _) = lookup();
        let row = repair_row("Unknown Place;bad-date;;;;;");
        let err = validate_repair_row(&row, &assets, &Requester::user(1)).unwrap_err();
        assert_eq!(err, RejectReason::UnknownAsset);
    }

    #[test]
    fn test_asset_name_is_case_sensitive() {
        let (assets, _) = lookup();
        let row = repair_row("house;2024-01-15;Roof;Me;;;");
        let err = validate_repair_row(&row, &assets, &Requester::user(1)).unwrap_err();
        assert_eq!(err, RejectReason::UnknownAsset);
    }

    #[test]
    fn test_missing_fields() {
        let (assets, _) = lookup();
        let requester = Requester::user(1);

        let err = validate_repair_row(&repair_row(";2024-01-15;Roof;Me;;;"), &assets, &requester).unwrap_err();
        assert_eq!(err, RejectReason::MissingField("asset_name"));

        let err = validate_repair_row(&repair_row("House;2024-01-15;;Me;;;"), &assets, &requester).unwrap_err();
        assert_eq!(err.to_string(), "missing field description");

        let err = validate_repair_row(&repair_row("House;;Roof;Me;;;"), &assets, &requester).unwrap_err();
        assert_eq!(err, RejectReason::MissingField("date"));
    }

    #[test]
    fn test_normalizer_failures() {
        let (assets, _) = lookup();
        let requester = Requester::user(1);

        let err = validate_repair_row(&repair_row("House;31/02/2024;Roof;Me;;;"), &assets, &requester).unwrap_err();
        assert_eq!(err, RejectReason::Normalize(NormalizeError::InvalidDateFormat("31/02/2024".into())));

        let err = validate_repair_row(&repair_row("House;2024-01-15;Roof;Me;;-5;"), &assets, &requester).unwrap_err();
        assert_eq!(err.code(), "invalid_currency_format");
    }

    #[test]
    fn test_lowercase_status_rejected() {
        let (assets, _) = lookup();
        let row = repair_row("House;2024-01-15;Roof;Me;;;planned");
        let err = validate_repair_row(&row, &assets, &Requester::user(1)).unwrap_err();
        assert_eq!(err, RejectReason::InvalidStatus("planned".into()));
        assert_eq!(err.code(), "invalid_status_value");
    }

    #[test]
    fn test_invalid_status() {
        let (assets, _) = lookup();
        let row = repair_row("House;2024-01-15;Roof;Me;;100;DONE");
        let err = validate_repair_row(&row, &assets, &Requester::user(1)).unwrap_err();
        assert_eq!(err, RejectReason::InvalidStatus("DONE".into()));
    }

    #[test]
    fn test_asset_rows() {
        let (assets, _) = lookup();
        let requester = Requester::user(1);
        let mut seen = HashSet::new();

        let asset = validate_asset_row(&asset_row("Garage;property"), &assets, &requester, &mut seen).unwrap();
        assert_eq!(asset.asset_type, AssetType::Property);

        let err = validate_asset_row(&asset_row("Garage;OTHER"), &assets, &requester, &mut seen).unwrap_err();
        assert_eq!(err, RejectReason::DuplicateAsset("Garage".into()));

        let err = validate_asset_row(&asset_row("House;PROPERTY"), &assets, &requester, &mut seen).unwrap_err();
        assert_eq!(err, RejectReason::AssetExists("House".into()));

        let err = validate_asset_row(&asset_row("Boat;YACHT"), &assets, &requester, &mut seen).unwrap_err();
        assert_eq!(err, RejectReason::InvalidAssetType("YACHT".into()));

        let err = validate_asset_row(&asset_row(";VEHICLE"), &assets, &requester, &mut seen).unwrap_err();
        assert_eq!(err, RejectReason::MissingField("name"));
    }

    #[test]
    fn test_rejected_asset_name_not_marked_seen() {
        let (assets, _) = lookup();
        let requester = Requester::user(1);
        let mut seen = HashSet::new();

        assert!(validate_asset_row(&asset_row("Shed;HUT"), &assets, &requester, &mut seen).is_err());
        assert!(validate_asset_row(&asset_row("Shed;OTHER"), &assets, &requester, &mut seen).is_ok());
    }
}
