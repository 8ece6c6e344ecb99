// src/utils/grid_debug.rs
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::extractors::{Extraction, Region};
use crate::grid::RawGrid;
use crate::utils::error::AppError;

/// Renders the grid one row per line, tagged with marker hits, repeated
/// markers and the section or series that owns the row. Markers come from
/// the index the extraction itself resolved regions against.
pub fn annotate_grid(grid: &RawGrid, extraction: &Extraction) -> String {
    let index = &extraction.index;
    let mut owners: Vec<(&str, &Region)> = extraction
        .sections
        .iter()
        .filter_map(|s| s.region.as_ref().map(|r| (s.name.as_str(), r)))
        .collect();
    if let Some(region) = &extraction.time_series.region {
        owners.push((extraction.time_series.name.as_str(), region));
    }

    let mut out = String::new();
    for (row, cells) in grid.rows().enumerate() {
        let mut tags = Vec::new();
        if let Some(text) = grid.cell(row, 0).label() {
            if index.row_of(&text) == Some(row) {
                tags.push(format!("MARKER {}", text));
            } else if index.is_marker(&text) {
                tags.push(format!("DUPLICATE {}", text));
            }
        }
        for (name, region) in &owners {
            if region.rows.contains(&row) {
                tags.push(format!("in {}", name));
            }
        }

        let rendered: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        let _ = writeln!(
            out,
            "{:>5} | {:<40} | {}",
            row,
            rendered.join(" | "),
            tags.join(", ")
        );
    }
    out
}

/// Writes the annotated grid dump to `filename`.
pub fn save_debug_grid(
    grid: &RawGrid,
    extraction: &Extraction,
    filename: &Path,
) -> Result<(), AppError> {
    if let Some(parent) = filename.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(filename, annotate_grid(grid, extraction))?;
    tracing::info!("Saved debug grid to {}", filename.display());
    Ok(())
}
