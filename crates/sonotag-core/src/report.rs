//! CSV report output.
//!
//! One header row, then one row per classified file:
//!
//! ```text
//! relative_path,tag_1,score_1,tag_2,score_2,tag_3,score_3
//! impacts/clang_01.wav,hit_armor_metal_heavy,0.4127,shield_block_metal,0.3981,...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ReportError;
use crate::types::ReportRow;

/// Serializes report rows with a fixed `top_k` column layout.
#[derive(Debug, Clone, Copy)]
pub struct ReportWriter {
    top_k: usize,
}

impl ReportWriter {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Header row: `relative_path`, then `tag_i`, `score_i` for i in 1..=k.
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(1 + 2 * self.top_k);
        header.push("relative_path".to_string());
        for i in 1..=self.top_k {
            header.push(format!("tag_{i}"));
            header.push(format!("score_{i}"));
        }
        header
    }

    /// Write all rows to a file, creating or truncating it.
    ///
    /// Row widths are checked before the destination is touched.
    pub fn write(&self, rows: &[ReportRow], destination: &Path) -> Result<(), ReportError> {
        self.check_rows(rows)?;
        let file = File::create(destination).map_err(|source| ReportError::Write {
            path: destination.to_path_buf(),
            source,
        })?;
        self.write_to(rows, BufWriter::new(file))?;
        tracing::info!("Wrote {} rows to {:?}", rows.len(), destination);
        Ok(())
    }

    /// Write all rows to an arbitrary sink.
    pub fn write_to<W: Write>(&self, rows: &[ReportRow], writer: W) -> Result<(), ReportError> {
        self.check_rows(rows)?;
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.header())?;

        for row in rows {
            let mut record = Vec::with_capacity(1 + 2 * self.top_k);
            record.push(row.relative_path.clone());
            for tag in &row.tags {
                record.push(tag.label_key.clone());
                record.push(format!("{:.4}", tag.score));
            }
            csv.write_record(&record)?;
        }

        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Every row must carry exactly `top_k` tags.
    fn check_rows(&self, rows: &[ReportRow]) -> Result<(), ReportError> {
        match rows.iter().find(|row| row.tags.len() != self.top_k) {
            Some(row) => Err(ReportError::RowWidth {
                relative_path: row.relative_path.clone(),
                expected: self.top_k,
                actual: row.tags.len(),
            }),
            None => Ok(()),
        }
    }

    /// Render the report as a string.
    pub fn to_csv_string(&self, rows: &[ReportRow]) -> Result<String, ReportError> {
        let mut buf = Vec::new();
        self.write_to(rows, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
