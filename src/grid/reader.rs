// src/grid/reader.rs
use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::ReaderBuilder;

use crate::grid::models::{Cell, RawGrid};
use crate::utils::error::GridError;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Reads a grid from `path`, choosing the reader by file extension.
pub fn read_grid(path: &Path, sheet: Option<&str>) -> Result<RawGrid, GridError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if extension == "csv" {
        read_csv_path(path)
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook(path, sheet)
    } else {
        Err(GridError::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Reads a header-less CSV file into a grid.
pub fn read_csv_path(path: &Path) -> Result<RawGrid, GridError> {
    tracing::info!("Reading CSV grid from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    read_csv_str(&content)
}

/// Parses CSV text into a grid. Every line is data; rows may differ in length.
pub fn read_csv_str(content: &str) -> Result<RawGrid, GridError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // Section dumps are ragged
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(csv_field_to_cell).collect());
    }

    tracing::debug!("Parsed {} CSV rows", rows.len());
    Ok(RawGrid::new(rows))
}

fn csv_field_to_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Numeric(n),
        _ => Cell::Text(field.to_string()),
    }
}

/// Reads one worksheet of an Excel or OpenDocument workbook.
/// Uses the named sheet when given, otherwise the first one.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<RawGrid, GridError> {
    tracing::info!("Reading workbook grid from {}", path.display());
    let mut workbook = open_workbook_auto(path)?;

    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(GridError::SheetNotFound(name.to_string()));
            }
            workbook.worksheet_range(name)?
        }
        None => workbook.worksheet_range_at(0).ok_or(GridError::NoWorksheet)??,
    };

    // Ranges start at the first used cell; pad back to absolute row/col
    // positions so fixed row layouts keep their meaning.
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(workbook_value_to_cell));
        rows.push(cells);
    }

    tracing::debug!("Read {} workbook rows", rows.len());
    Ok(RawGrid::new(rows))
}

fn workbook_value_to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Numeric(*f),
        Data::Int(i) => Cell::Numeric(*i as f64),
        Data::DateTime(_) | Data::DateTimeIso(_) => match value.as_datetime() {
            Some(dt) => Cell::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::from_text(&value.to_string()),
        },
        other => Cell::from_text(&other.to_string()),
    }
}
