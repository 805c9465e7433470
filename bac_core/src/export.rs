//! CSV export of the drink log.
//!
//! Writes a full snapshot (truncate and rewrite) rather than appending, so
//! the export always mirrors the current log including deletions.

use crate::{Beverage, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: i64,
    consumed_time: String,
    amount: f64,
    volume_unit: &'static str,
    abv: f64,
}

impl From<&Beverage> for CsvRow {
    fn from(beverage: &Beverage) -> Self {
        CsvRow {
            id: beverage.id,
            consumed_time: beverage.consumed_time.to_rfc3339(),
            amount: beverage.amount,
            volume_unit: beverage.volume_unit.as_str(),
            abv: beverage.abv,
        }
    }
}

/// Write the drink log to a CSV file, oldest drink first.
///
/// Returns the number of rows written. The file is fsynced before return.
pub fn write_drink_log(beverages: &[Beverage], csv_path: &Path) -> Result<usize> {
    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut sorted: Vec<&Beverage> = beverages.iter().collect();
    sorted.sort_by(|a, b| a.consumed_time.cmp(&b.consumed_time).then(a.id.cmp(&b.id)));

    let mut writer = csv::Writer::from_path(csv_path)?;
    for beverage in &sorted {
        writer.serialize(CsvRow::from(*beverage))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} drinks to CSV at {:?}", sorted.len(), csv_path);
    Ok(sorted.len())
}
