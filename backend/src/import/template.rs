//! Downloadable example files.
//!
//! Headers come from [`columns`](super::validator::columns), the same
//! constants the importer checks, so a template always imports cleanly once
//! its assets exist.

use std::io::{self, Write};

use super::validator::columns::{ASSET_HEADER, REPAIR_HEADER};
use crate::models::SchemaKind;
use crate::parser::DELIMITER;

const ASSET_EXAMPLES: &[&[&str]] = &[
    &["House on Main Street", "PROPERTY"],
    &["Office Building", "PROPERTY"],
    &["Company Car", "VEHICLE"],
];

const REPAIR_EXAMPLES: &[&[&str]] = &[
    &["House on Main Street", "2024-01-15", "Roof repair", "John Smith", "Fixed leak in roof", "643.36", "COMPLETED"],
    &["Office Building", "2024-02-10", "Heating maintenance", "Mike Johnson", "Annual service", "150.50", "COMPLETED"],
    &["Company Car", "2024-03-05", "Oil change", "Auto Service", "Regular maintenance", "75.00", "COMPLETED"],
];

/// Header and example rows for a kind.
pub fn template_rows(kind: SchemaKind) -> (&'static [&'static str], &'static [&'static [&'static str]]) {
    match kind {
        SchemaKind::Asset => (ASSET_HEADER, ASSET_EXAMPLES),
        SchemaKind::Repair => (REPAIR_HEADER, REPAIR_EXAMPLES),
    }
}

/// Suggested download file name.
pub fn template_file_name(kind: SchemaKind) -> String {
    format!("{}_template.csv", kind)
}

/// Write the template for `kind` as `;`-delimited CSV.
pub fn write_template<W: Write>(kind: SchemaKind, writer: W) -> csv::Result<()> {
    let (header, examples) = template_rows(kind);
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER as u8)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    csv_writer.write_record(header)?;
    for row in examples {
        csv_writer.write_record(*row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// The template for `kind` as a string.
pub fn template_csv(kind: SchemaKind) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write_template(kind, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))
}
