//! Delimiter-aware row splitting with a header-driven column mapping.
//!
//! The first non-blank line is the header; its column names become the
//! runtime schema for the rest of the file, so reordered columns import fine
//! as long as the names match. No quoting support: a value containing `;`
//! is split like any other.
//!
//! Blank lines are skipped and not counted: the header is row 1 and each
//! following non-blank line is one higher.

use std::collections::HashMap;

/// Field delimiter for every import and template file.
pub const DELIMITER: char = ';';

/// Clean a raw cell: surrounding whitespace and double quotes are dropped.
fn clean_cell(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

/// Column name -> position, built once per import from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl HeaderMap {
    /// Parse a header line. Names are trimmed and lower-cased; on duplicate
    /// names the first occurrence wins.
    pub fn parse(line: &str) -> Self {
        let columns: Vec<String> = line
            .split(DELIMITER)
            .map(|s| clean_cell(s).to_lowercase())
            .collect();

        let mut positions = HashMap::new();
        for (i, name) in columns.iter().enumerate() {
            if !name.is_empty() {
                positions.entry(name.clone()).or_insert(i);
            }
        }

        Self { columns, positions }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Required columns absent from this header, in the order given.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| !self.positions.contains_key(**name))
            .copied()
            .collect()
    }

    /// Map a data line onto the header columns.
    ///
    /// Missing trailing cells read as blank, extra cells are ignored.
    pub fn record(&self, line: &str, row: usize) -> RowRecord {
        let cells: Vec<&str> = line.split(DELIMITER).collect();
        let values = self
            .positions
            .iter()
            .map(|(name, &i)| {
                let value = cells.get(i).map(|s| clean_cell(s)).unwrap_or("");
                (name.clone(), value.to_string())
            })
            .collect();

        RowRecord { row, values }
    }
}

/// One data line mapped to column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// 1-based row number among non-blank lines, the header being row 1.
    pub row: usize,
    values: HashMap<String, String>,
}

impl RowRecord {
    /// Raw (cleaned) value of a column, empty when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }

    /// Value of a column, `None` when absent or blank.
    pub fn non_blank(&self, column: &str) -> Option<&str> {
        Some(self.get(column)).filter(|v| !v.is_empty())
    }
}

/// A decoded file split into header and data rows.
#[derive(Debug, Clone, Default)]
pub struct SplitFile {
    /// `None` when the file has no non-blank line at all.
    pub header: Option<HeaderMap>,
    /// Data rows in file order, blank lines skipped.
    pub rows: Vec<RowRecord>,
}

/// Split decoded lines into a header and row records.
///
/// # Example
/// ```ignore
/// use repairlog::parser::split_rows;
///
/// let split = split_rows(&["name;type", "", "House;PROPERTY"]);
/// assert_eq!(split.rows.len(), 1);
/// assert_eq!(split.rows[0].row, 2);
/// assert_eq!(split.rows[0].get("name"), "House");
/// ```
pub fn split_rows(lines: &[&str]) -> SplitFile {
    let mut numbered = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| (i + 1, *line));

    let Some((_, header_text)) = numbered.next() else {
        return SplitFile::default();
    };

    let header = HeaderMap::parse(header_text);
    let rows = numbered
        .map(|(row, line)| header.record(line, row))
        .collect();

    SplitFile {
        header: Some(header),
        rows,
    }
}
