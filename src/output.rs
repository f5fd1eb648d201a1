//! Output formatting and persistence for response tables.
//!
//! Supports CSV export, JSON serialization, and terminal tables.

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::stats::{Field, ResponseTable};

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON to `path`.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    debug!(path = %path.display(), "Wrote JSON");
    Ok(())
}

/// Writes `table` as CSV to `path`, replacing any existing file.
pub fn write_table(path: &Path, table: &ResponseTable) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_table_to(file, table).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), rows = table.len(), "Wrote CSV");
    Ok(())
}

/// Writes `table` as CSV: one header row in column order, then one row per record.
pub fn write_table_to<W: Write>(writer: W, table: &ResponseTable) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(table.headers())?;
    for record in &table.records {
        wtr.write_record(table.row(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Renders the given columns of `table` for the terminal. Columns the table
/// does not carry are skipped.
pub fn render_table(table: &ResponseTable, columns: &[Field]) -> Table {
    let columns: Vec<Field> = columns.iter().copied().filter(|f| table.has(*f)).collect();

    let mut out = Table::new();
    out.load_preset(UTF8_FULL);
    out.set_content_arrangement(ContentArrangement::Dynamic);
    out.set_header(
        columns
            .iter()
            .map(|f| Cell::new(table.header(*f)))
            .collect::<Vec<_>>(),
    );
    for record in &table.records {
        out.add_row(
            columns
                .iter()
                .map(|f| Cell::new(table.value(record, *f).to_string()))
                .collect::<Vec<_>>(),
        );
    }
    out
}
