//! CSV loader for quiz-response exports.
//!
//! Reading and cleaning are separate steps: [`read_raw`] only splits the file
//! into string cells, [`clean`] coerces them into a typed [`ResponseTable`].

use anyhow::{Context, Result};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::stats::{
    Field, ResponseRecord, ResponseTable, is_na, is_percent_header, parse_number,
};

/// Header row and string cells of a CSV export, before any coercion.
#[derive(Debug, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

/// Reads a CSV file into memory.
///
/// # Errors
///
/// Fails if the file cannot be opened, has no header row, or any row is not
/// valid CSV. No rows are returned on failure.
pub fn read_raw(path: &Path) -> Result<RawTable> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_raw_from(file).with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads CSV from any reader; see [`read_raw`].
pub fn read_raw_from<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    anyhow::ensure!(!headers.is_empty(), "no columns to parse");
    let rows = rdr.records().collect::<csv::Result<Vec<_>>>()?;
    Ok(RawTable { headers, rows })
}

/// Coerces a raw table into typed records.
///
/// Percentage columns (header contains `%`) become numbers, with blank or
/// malformed cells read as 0. Response columns (header contains `response`)
/// are always present as text, with blank or missing-value cells (`NaN`,
/// `N/A`, `null` and the like) as the empty string. Identifier columns keep
/// their text as-is; only a missing-value cell reads as absent. Unknown
/// columns are kept as extras in their original position.
pub fn clean(raw: RawTable) -> ResponseTable {
    let mut table = ResponseTable::default();

    for header in &raw.headers {
        let field = match Field::from_name(header) {
            Some(field) if !table.has(field) => field,
            _ => {
                table.extra_headers.push(header.clone());
                Field::Extra(table.extra_headers.len() - 1)
            }
        };
        table.columns.push(field);
    }

    let columns = &table.columns;
    let extra_headers = &table.extra_headers;
    let records = raw
        .rows
        .iter()
        .map(|row| {
            let mut record = ResponseRecord {
                extra: vec![String::new(); extra_headers.len()],
                ..Default::default()
            };
            for (idx, field) in columns.iter().enumerate() {
                let cell = row.get(idx).unwrap_or("");
                set_cell(&mut record, extra_headers, *field, cell);
            }
            record
        })
        .collect();
    table.records = records;

    debug!(
        columns = table.columns.len(),
        extra_columns = table.extra_headers.len(),
        rows = table.len(),
        "Cleaned raw table"
    );
    table
}

/// Reads and cleans a CSV export.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<ResponseTable> {
    let table = clean(read_raw(path)?);
    info!(rows = table.len(), "Loaded response table");
    Ok(table)
}

fn set_cell(record: &mut ResponseRecord, extra_headers: &[String], field: Field, cell: &str) {
    let pct = || Some(parse_number(cell).unwrap_or(0.0));
    let label = || (!is_na(cell)).then(|| cell.to_string());
    let response = || Some(if is_na(cell) { String::new() } else { cell.to_string() });

    match field {
        Field::DocumentId => record.document_id = label(),
        Field::DocumentName => record.document_name = label(),
        Field::Pointer => record.pointer = label(),
        Field::Course => record.course = label(),
        Field::TopThree => record.top_three = Some(cell.to_string()),
        Field::NumResponses => record.num_responses = parse_count(cell),
        Field::Failed => record.failed = pct(),
        Field::Giveup => record.giveup = pct(),
        Field::TriggerGoto => record.trigger_goto = pct(),
        Field::WrongCombined => record.wrong_combined = pct(),
        Field::WrongPct(rank) => record.wrong_mut(rank).pct = pct(),
        Field::WrongResponse(rank) => record.wrong_mut(rank).response = response(),
        Field::Extra(idx) => {
            let header = extra_headers.get(idx).map(String::as_str).unwrap_or("");
            // Blank response cells are already the empty string.
            record.extra[idx] = if is_percent_header(header) {
                parse_number(cell).unwrap_or(0.0).to_string()
            } else {
                cell.to_string()
            };
        }
    }
}

/// Attempt counts may be exported as whole floats (`7592.0`).
fn parse_count(cell: &str) -> Option<u64> {
    let trimmed = cell.trim();
    trimmed.parse::<u64>().ok().or_else(|| {
        parse_number(trimmed)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    })
}
