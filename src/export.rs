use crate::record::MemberRecord;
use anyhow::{Context, Result};
use csv::Writer;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Sorted union of every field name across `records`.
pub fn csv_header(records: &[MemberRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.field_names())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn export_csv(records: &[MemberRecord], output_path: &Path) -> Result<()> {
    debug!("Exporting {} records to CSV: {}", records.len(), output_path.display());

    let header = csv_header(records);
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(&header)?;

    // Fields a record never saw are written as empty cells
    for record in records {
        wtr.write_record(header.iter().map(|name| record.field(name).unwrap_or("")))?;
    }

    wtr.flush()?;
    info!("Successfully exported {} records to CSV: {}", records.len(), output_path.display());

    Ok(())
}

pub fn export_json(records: &[MemberRecord], output_path: &Path) -> Result<()> {
    debug!("Exporting {} records to JSON: {}", records.len(), output_path.display());

    // serde_json writes non-ASCII text literally
    let json_string = serde_json::to_string_pretty(records)?;

    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    file.write_all(json_string.as_bytes())?;

    info!("Successfully exported {} records to JSON: {}", records.len(), output_path.display());

    Ok(())
}

/// Read records back from a JSON export.
pub fn load_json(path: &Path) -> Result<Vec<MemberRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
