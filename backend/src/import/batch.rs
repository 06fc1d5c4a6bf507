//! The batch importer.
//!
//! ```text
//! ┌───────────┐     ┌──────────┐     ┌───────────┐     ┌─────────────┐
//! │ raw bytes │────▶│ resolve  │────▶│ split ';' │────▶│ validate    │──▶ BatchResult
//! │ + kind    │     │ encoding │     │ + header  │     │ row by row  │
//! └───────────┘     └──────────┘     └───────────┘     └─────────────┘
//! ```
//!
//! Only undecodable input and a header missing required columns fail the
//! call. Every other problem becomes a [`RowOutcome::Rejected`] and the next
//! row is processed. Rows are handled strictly in file order.

use std::collections::HashSet;

use super::validator::{required_columns, validate_asset_row, validate_repair_row};
use super::AssetLookup;
use crate::error::{ImportError, RejectReason};
use crate::models::{NormalizedRecord, Requester, SchemaKind};
use crate::parser::{resolve, split_rows, DecodedText};

/// An upload as received: bytes plus the declared record kind.
#[derive(Debug, Clone, Copy)]
pub struct RawUpload<'a> {
    pub bytes: &'a [u8],
    pub kind: SchemaKind,
}

impl<'a> RawUpload<'a> {
    pub fn new(bytes: &'a [u8], kind: SchemaKind) -> Self {
        Self { bytes, kind }
    }
}

/// Result for one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted {
        row: usize,
        record: NormalizedRecord,
    },
    Rejected {
        row: usize,
        reason: RejectReason,
    },
}

impl RowOutcome {
    /// 1-based row number, blank lines not counted.
    pub fn row(&self) -> usize {
        match self {
            Self::Accepted { row, .. } | Self::Rejected { row, .. } => *row,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// All row outcomes of one file, in file order, with counts.
///
/// Built by the importer and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    kind: SchemaKind,
    outcomes: Vec<RowOutcome>,
    accepted: usize,
    rejected: usize,
}

impl BatchResult {
    fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            outcomes: Vec::new(),
            accepted: 0,
            rejected: 0,
        }
    }

    fn push(&mut self, outcome: RowOutcome) {
        if outcome.is_accepted() {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn outcomes(&self) -> &[RowOutcome] {
        &self.outcomes
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    /// Number of data rows seen (blank lines excluded).
    pub fn total_rows(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Accepted records with their row numbers.
    pub fn accepted(&self) -> impl Iterator<Item = (usize, &NormalizedRecord)> {
        self.outcomes.iter().filter_map(|o| match o {
            RowOutcome::Accepted { row, record } => Some((*row, record)),
            RowOutcome::Rejected { .. } => None,
        })
    }

    /// Rejections with their row numbers.
    pub fn rejections(&self) -> impl Iterator<Item = (usize, &RejectReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            RowOutcome::Rejected { row, reason } => Some((*row, reason)),
            RowOutcome::Accepted { .. } => None,
        })
    }

    /// User-facing error lines, e.g. `Row 3: unknown asset`.
    pub fn error_messages(&self) -> Vec<String> {
        self.rejections()
            .map(|(row, reason)| format!("Row {}: {}", row, reason))
            .collect()
    }
}

/// Import an upload against a snapshot of existing assets.
///
/// # Example
/// ```ignore
/// use std::collections::HashMap;
/// use repairlog::import::{import_batch, RawUpload};
/// use repairlog::models::{Requester, SchemaKind};
///
/// let csv = "name;type\nGarage;PROPERTY\n";
/// let assets = HashMap::new();
/// let result = import_batch(RawUpload::new(csv.as_bytes(), SchemaKind::Asset), &assets, &Requester::user(1)).unwrap();
/// assert_eq!(result.accepted_count(), 1);
/// ```
pub fn import_batch<L: AssetLookup + ?Sized>(
    upload: RawUpload<'_>,
    lookup: &L,
    requester: &Requester,
) -> Result<BatchResult, ImportError> {
    let decoded = resolve(upload.bytes)?;
    import_decoded(&decoded, upload.kind, lookup, requester)
}

/// Import already-decoded text.
pub fn import_decoded<L: AssetLookup + ?Sized>(
    decoded: &DecodedText,
    kind: SchemaKind,
    lookup: &L,
    requester: &Requester,
) -> Result<BatchResult, ImportError> {
    let lines = decoded.lines();
    let split = split_rows(&lines);
    let mut result = BatchResult::new(kind);

    let Some(header) = split.header else {
        return Ok(result);
    };

    let missing = header.missing(required_columns(kind));
    if !missing.is_empty() {
        return Err(ImportError::SchemaMismatch {
            kind,
            missing: missing.into_iter().map(String::from).collect(),
        });
    }

    let mut seen_names = HashSet::new();
    for row in &split.rows {
        let validated = match kind {
            SchemaKind::Asset => validate_asset_row(row, lookup, requester, &mut seen_names)
                .map(NormalizedRecord::Asset),
            SchemaKind::Repair => {
                validate_repair_row(row, lookup, requester).map(NormalizedRecord::Repair)
            }
        };

        result.push(match validated {
            Ok(record) => RowOutcome::Accepted {
                row: row.row,
                record,
            },
            Err(reason) => RowOutcome::Rejected {
                row: row.row,
                reason,
            },
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetId, NormalizedRepair, RepairStatus};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    const REPAIRS_CSV: &str = "asset_name;date;description;performed_by;notes;cost_cents;status\n\
        House;2024-01-15;Roof repair;John Smith;;643.36;COMPLETED\n\
        Unknown Place;bad-date;;;;;\n";

    fn house_lookup() -> (HashMap<String, AssetId>, AssetId) {
        let house = AssetId::new();
        (HashMap::from([("House".to_string(), house)]), house)
    }

    fn import(csv: &str, kind: SchemaKind, lookup: &HashMap<String, AssetId>) -> Result<BatchResult, ImportError> {
        import_batch(RawUpload::new(csv.as_bytes(), kind), lookup, &Requester::user(1))
    }

    #[test]
    fn test_end_to_end_repairs() {
        let (assets, house) = house_lookup();
        let result = import(REPAIRS_CSV, SchemaKind::Repair, &assets).unwrap();

        assert_eq!(result.kind(), SchemaKind::Repair);
        assert_eq!(result.accepted_count(), 1);
        assert_eq!(result.rejected_count(), 1);

        let expected = NormalizedRepair {
            asset_reference: house,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: "Roof repair".into(),
            performed_by: "John Smith".into(),
            notes: None,
            cost_minor_units: 64336,
            status: RepairStatus::Completed,
        };
        assert_eq!(
            result.outcomes()[0],
            RowOutcome::Accepted {
                row: 2,
                record: NormalizedRecord::Repair(expected)
            }
        );
        assert_eq!(
            result.outcomes()[1],
            RowOutcome::Rejected {
                row: 3,
                reason: RejectReason::UnknownAsset
            }
        );
        assert_eq!(result.error_messages(), vec!["Row 3: unknown asset"]);
    }

    #[test]
    fn test_idempotent() {
        let (assets, _) = house_lookup();
        let first = import(REPAIRS_CSV, SchemaKind::Repair, &assets).unwrap();
        let second = import(REPAIRS_CSV, SchemaKind::Repair, &assets).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_row_order_preserved() {
        let (assets, _) = house_lookup();
        let csv = "asset_name;date;description;performed_by\n\
            Nowhere;2024-01-01;A;B\n\
            House;2024-01-02;Paint;Bob\n\
            \n\
            House;not-a-date;Paint;Bob\n\
            House;2024-01-04;Floor;Ann\n";
        let result = import(csv, SchemaKind::Repair, &assets).unwrap();

        let rows: Vec<usize> = result.outcomes().iter().map(RowOutcome::row).collect();
        assert_eq!(rows, vec![2, 3, 4, 5]);
        let accepted: Vec<bool> = result.outcomes().iter().map(RowOutcome::is_accepted).collect();
        assert_eq!(accepted, vec![false, true, false, true]);
    }

    #[test]
    fn test_blank_line_does_not_shift_row_numbers() {
        let (assets, _) = house_lookup();
        let result = import("name;type\nGarage;PROPERTY\n\nBoat;YACHT\n", SchemaKind::Asset, &assets).unwrap();

        let rows: Vec<usize> = result.outcomes().iter().map(RowOutcome::row).collect();
        assert_eq!(rows, vec![2, 3]);
        assert!(result.error_messages()[0].starts_with("Row 3: invalid asset type 'YACHT'"));
    }

    #[test]
    fn test_header_only_is_empty_result() {
        let (assets, _) = house_lookup();
        let result = import("asset_name;date;description;performed_by\n", SchemaKind::Repair, &assets).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.accepted_count(), 0);
        assert_eq!(result.rejected_count(), 0);
    }

    #[test]
    fn test_zero_byte_upload_is_empty_result() {
        let (assets, _) = house_lookup();
        let result = import("", SchemaKind::Asset, &assets).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_schema_mismatch() {
        let (assets, _) = house_lookup();
        let err = import("name;type\nHouse;PROPERTY\n", SchemaKind::Repair, &assets).unwrap_err();

        match &err {
            ImportError::SchemaMismatch { kind, missing } => {
                assert_eq!(*kind, SchemaKind::Repair);
                assert_eq!(missing, &["asset_name", "date", "description", "performed_by"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "file does not match expected template for repairs.");
    }

    #[test]
    fn test_reordered_header() {
        let (assets, _) = house_lookup();
        let csv = "performed_by;description;date;asset_name\nBob;Paint;05.03.2024;House\n";
        let result = import(csv, SchemaKind::Repair, &assets).unwrap();
        assert_eq!(result.accepted_count(), 1);
    }

    #[test]
    fn test_wrong_encoding_fails_at_header() {
        let (assets, _) = house_lookup();
        let bytes: &[u8] = &[0xFF, 0x00, 0xC3, 0x28, 0x00];
        let err = import_batch(RawUpload::new(bytes, SchemaKind::Asset), &assets, &Requester::user(1)).unwrap_err();
        assert!(matches!(err, ImportError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_stray_nul_byte_is_kept_as_text() {
        let assets: HashMap<String, AssetId> = HashMap::new();
        let bytes = b"name;type\nCaf\xe9\x00;OTHER\n";
        let result = import_batch(RawUpload::new(bytes, SchemaKind::Asset), &assets, &Requester::user(1)).unwrap();
        assert_eq!(result.accepted_count(), 1);
    }

    #[test]
    fn test_asset_import_duplicates() {
        let (assets, _) = house_lookup();
        let csv = "name;type\nGarage;PROPERTY\nHouse;PROPERTY\nGarage;OTHER\nVan;VEHICLE\n";
        let result = import(csv, SchemaKind::Asset, &assets).unwrap();

        assert_eq!(result.accepted_count(), 2);
        assert_eq!(
            result.error_messages(),
            vec![
                "Row 3: asset 'House' already exists",
                "Row 4: duplicate asset name 'Garage' in file",
            ]
        );
    }

    #[test]
    fn test_windows_1251_upload() {
        // "name;type\nДача;PROPERTY\n" in Windows-1251
        let mut bytes = b"name;type\n".to_vec();
        bytes.extend_from_slice(&[0xC4, 0xE0, 0xF7, 0xE0]);
        bytes.extend_from_slice(b";PROPERTY\n");

        let assets: HashMap<String, AssetId> = HashMap::new();
        let result = import_batch(RawUpload::new(&bytes, SchemaKind::Asset), &assets, &Requester::user(1)).unwrap();
        assert_eq!(result.accepted_count(), 1);
    }
}
