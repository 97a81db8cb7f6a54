//! Spreadsheet loading: first sheet only, header row becomes the row keys.

use crate::domain::model::{CellValue, RawRow, Sheet};
use crate::utils::error::{Result, StockSyncError};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;

const EMPTY_HEADER: &str = "__EMPTY";

/// Parses `data` according to the extension of `file_name`.
pub fn load_spreadsheet(file_name: &str, data: Vec<u8>) -> Result<Sheet> {
    let is_csv = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        load_csv(&data)
    } else {
        load_workbook(data)
    }
}

pub fn load_workbook(data: Vec<u8>) -> Result<Sheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;

    let sheet_name = workbook.sheet_names().first().cloned().ok_or_else(|| {
        StockSyncError::ProcessingError {
            message: "Spreadsheet contains no sheets".to_string(),
        }
    })?;
    tracing::debug!("Reading first sheet '{}'", sheet_name);

    let range = workbook.worksheet_range(&sheet_name)?;
    // Ranges start at the first used cell; keep column letters aligned with the file.
    let (_, start_col) = range.start().unwrap_or((0, 0));
    let padding = start_col as usize;

    let grid = range.rows().map(|cells| {
        std::iter::repeat(CellValue::Empty)
            .take(padding)
            .chain(cells.iter().map(cell_value))
            .collect::<Vec<_>>()
    });

    Ok(build_sheet(grid))
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
    }
}

pub fn load_csv(data: &[u8]) -> Result<Sheet> {
    let delimiter = sniff_delimiter(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data);

    let mut grid = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|field| CellValue::from(String::from_utf8_lossy(field).into_owned()))
                .collect::<Vec<_>>(),
        );
    }

    // Exports saved from spreadsheet tools often start with a BOM.
    if let Some(CellValue::Text(first)) = grid.first_mut().and_then(|row| row.first_mut()) {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }

    Ok(build_sheet(grid.into_iter()))
}

/// Semicolons win when the header line has more of them than commas.
fn sniff_delimiter(data: &[u8]) -> u8 {
    let first_line = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn build_sheet<I>(mut grid: I) -> Sheet
where
    I: Iterator<Item = Vec<CellValue>>,
{
    let Some(header_cells) = grid.next() else {
        return Sheet::default();
    };
    let headers = unique_headers(
        header_cells
            .iter()
            .map(|cell| cell.to_text().into_owned())
            .collect(),
    );

    let mut rows = Vec::new();
    for cells in grid {
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        let mut values = cells.into_iter();
        let row = RawRow {
            cells: headers
                .iter()
                .map(|header| (header.clone(), values.next().unwrap_or_default()))
                .collect(),
        };
        rows.push(row);
    }

    Sheet { headers, rows }
}

/// Blank headers become `__EMPTY`; repeats get `_1`, `_2`, ... suffixes.
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());

    for header in raw {
        let base = if header.is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            header
        };

        let mut name = base.clone();
        if used.contains(&name) {
            let counter = counters.entry(base.clone()).or_insert(0);
            loop {
                *counter += 1;
                name = format!("{}_{}", base, counter);
                if !used.contains(&name) {
                    break;
                }
            }
        }

        used.insert(name.clone());
        headers.push(name);
    }

    headers
}
