use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use super::{RecordTable, Value};

/// Load a record table from a CSV file with a header row
pub fn read_csv(path: &Path) -> Result<RecordTable> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file at {}", path.display()))?;
    let table = read_csv_from_reader(file)
        .with_context(|| format!("Failed to parse CSV in {}", path.display()))?;
    tracing::debug!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Parse CSV from any reader. Ragged rows are rejected by the csv reader.
pub fn read_csv_from_reader<R: Read>(rdr: R) -> Result<RecordTable, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = RecordTable::new(columns);
    for result in reader.records() {
        let record = result?;
        table.rows.push(record.iter().map(Value::parse).collect());
    }
    Ok(table)
}

/// Write a table as CSV atomically.
///
/// The file is never left half-written: content goes to a temporary file that
/// replaces `path` on commit.
pub fn write_csv(path: &Path, table: &RecordTable) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    write_csv_to_writer(&mut file, table).context("Failed to serialize ranked table")?;
    file.commit()
        .with_context(|| format!("Failed to save CSV to {}", path.display()))?;
    Ok(())
}

pub fn write_csv_to_writer<W: Write>(wtr: W, table: &RecordTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(wtr);
    writer.write_record(&table.columns)?;
    for row in 0..table.len() {
        writer.write_record((0..table.columns.len()).map(|c| table.cell(row, c).to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
