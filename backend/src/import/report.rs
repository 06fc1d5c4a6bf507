//! Rejection report as CSV, so users can fix rows in their spreadsheet.

use std::io::Write;

use super::batch::BatchResult;
use crate::parser::DELIMITER;

/// Write `row;code;reason` lines for every rejected row, in file order.
pub fn write_rejections<W: Write>(batch: &BatchResult, writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER as u8)
        .from_writer(writer);

    csv_writer.write_record(["row", "code", "reason"])?;
    for (row, reason) in batch.rejections() {
        csv_writer.write_record([row.to_string(), reason.code().to_string(), reason.to_string()])?;
    }
    csv_writer.flush()?;
    Ok(())
}
