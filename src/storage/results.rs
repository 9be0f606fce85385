use anyhow::{Result, Context};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::extract::ResultRecord;

/// File name of the result table inside the output dir
pub const RESULTS_FILE: &str = "results.csv";

pub(crate) const BOM: &[u8] = "\u{feff}".as_bytes();

/// Write the records as a BOM-prefixed UTF-8 CSV file
pub fn write_results(path: &Path, records: &[ResultRecord]) -> Result<()> {
    let file = File::create(path)
        .context(format!("Failed to create results file: {}", path.display()))?;

    write_records(BufWriter::new(file), records)
        .context(format!("Failed to write results file: {}", path.display()))?;

    info!("Wrote {} record(s) to {}", records.len(), path.display());

    Ok(())
}

/// Serialize records in input order; unknown fields become empty cells
pub fn write_records<W: Write>(mut writer: W, records: &[ResultRecord]) -> Result<()> {
    writer.write_all(BOM)?;

    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    if records.is_empty() {
        csv.write_record(["url", "name", "rating", "joined_year", "years_active", "listing_count", "notes"])?;
    }
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;

    let mut writer = csv
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    writer.flush()?;

    Ok(())
}
