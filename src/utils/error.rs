// src/utils/error.rs
#![allow(dead_code)]
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum GridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error), // Automatically convert csv errors

    #[error("Workbook read failed: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook has no sheet named '{0}'")]
    SheetNotFound(String),

    #[error("Workbook contains no worksheets")]
    NoWorksheet,

    #[error("Unsupported input format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Marker '{marker}' appears at row {first_row} and again at row {row}")]
    DuplicateMarker {
        marker: String,
        first_row: usize,
        row: usize,
    },

    #[error("Invalid vocabulary: {0}")]
    InvalidVocabulary(String),
}

/// Why a single cell could not be turned into the value a table needs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoerceError {
    #[error("cell is empty")]
    Empty,

    #[error("'{0}' is not a number")]
    NotNumeric(String),

    #[error("{0} is not a whole count")]
    NotInteger(f64),

    #[error("{0} is too large to be an exact count")]
    OutOfRange(f64),

    #[error("numeric cell {0} cannot be read as a date")]
    NotText(f64),

    #[error("'{0}' is not a recognised date")]
    NotDate(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Reading input grid failed: {0}")]
    Grid(#[from] GridError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
