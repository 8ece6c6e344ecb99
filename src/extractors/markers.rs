// src/extractors/markers.rs
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde::Serialize;

use crate::config::SectionSpec;
use crate::grid::{Cell, RawGrid};

/// A marker string seen again after its first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMarker {
    pub marker: String,
    pub first_row: usize,
    pub row: usize,
}

/// First-occurrence row of every marker found in column 0.
#[derive(Debug, Clone, Default)]
pub struct MarkerIndex {
    rows: HashMap<String, usize>,
    duplicates: Vec<DuplicateMarker>,
    markers: HashSet<String>,
    grid_rows: usize,
}

impl MarkerIndex {
    /// Scans column 0 once, recording where each marker first appears.
    ///
    /// Cells are compared by their trimmed label, so a numeric cell such as
    /// a year header matches the marker `"2019"`. Later occurrences do not
    /// move the boundary; they are kept as `DuplicateMarker` diagnostics.
    pub fn locate(grid: &RawGrid, markers: &[&str]) -> Self {
        let known: HashSet<String> = markers.iter().map(|m| m.to_string()).collect();
        let mut rows: HashMap<String, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for row in 0..grid.row_count() {
            let Some(text) = grid.cell(row, 0).label() else {
                continue;
            };
            if !known.contains(&text) {
                continue;
            }
            match rows.get(&text) {
                Some(&first_row) => {
                    tracing::warn!(
                        "Marker '{}' repeats at row {} (first seen at row {}); keeping the first",
                        text, row, first_row
                    );
                    duplicates.push(DuplicateMarker {
                        marker: text,
                        first_row,
                        row,
                    });
                }
                None => {
                    tracing::trace!("Located marker '{}' at row {}", text, row);
                    rows.insert(text, row);
                }
            }
        }

        tracing::debug!(
            "Located {} of {} markers in {} rows",
            rows.len(),
            known.len(),
            grid.row_count()
        );

        Self {
            rows,
            duplicates,
            markers: known,
            grid_rows: grid.row_count(),
        }
    }

    /// Row of the first occurrence, if the marker was found.
    pub fn row_of(&self, marker: &str) -> Option<usize> {
        self.rows.get(marker).copied()
    }

    /// True when `text` (already trimmed) is one of the vocabulary markers.
    pub fn is_marker(&self, text: &str) -> bool {
        self.markers.contains(text)
    }

    /// True when the cell's label is one of the vocabulary markers.
    pub fn is_marker_cell(&self, cell: &Cell) -> bool {
        cell.label().is_some_and(|label| self.is_marker(&label))
    }

    pub fn located(&self) -> impl Iterator<Item = (&str, usize)> {
        self.rows.iter().map(|(m, r)| (m.as_str(), *r))
    }

    pub fn duplicates(&self) -> &[DuplicateMarker] {
        &self.duplicates
    }

    pub fn grid_rows(&self) -> usize {
        self.grid_rows
    }

    /// Rows following `marker` up to the next located marker or the grid end.
    /// `None` when the marker was not located.
    pub fn region(&self, marker: &str) -> Option<Region> {
        let start = self.row_of(marker)?;
        let end = self
            .rows
            .values()
            .copied()
            .filter(|&r| r > start)
            .min()
            .unwrap_or(self.grid_rows);
        Some(Region {
            rows: start + 1..end,
            source: RegionSource::Marker { row: start },
        })
    }
}

/// How a region was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionSource {
    Marker { row: usize },
    FixedRows,
}

/// Contiguous row range `[start, end)` owned by one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub rows: Range<usize>,
    pub source: RegionSource,
}

impl Region {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// --- Region Strategies ---
pub trait RegionStrategy {
    fn name(&self) -> &'static str;
    fn resolve(&self, spec: &SectionSpec, index: &MarkerIndex) -> Option<Region>;
}

/// Region between the section's marker and the next located marker.
pub struct MarkerRegionStrategy;

impl RegionStrategy for MarkerRegionStrategy {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn resolve(&self, spec: &SectionSpec, index: &MarkerIndex) -> Option<Region> {
        index.region(&spec.marker)
    }
}

/// The section's configured fixed rows, clamped to the grid.
pub struct FixedRowsStrategy;

impl RegionStrategy for FixedRowsStrategy {
    fn name(&self) -> &'static str {
        "fixed rows"
    }

    fn resolve(&self, spec: &SectionSpec, index: &MarkerIndex) -> Option<Region> {
        let rows = spec.rows?;
        let end = rows.end.min(index.grid_rows());
        let start = rows.start.min(end);
        Some(Region {
            rows: start..end,
            source: RegionSource::FixedRows,
        })
    }
}

/// Tries each strategy in order and returns the first region found.
pub fn resolve_region(
    strategies: &[Box<dyn RegionStrategy>],
    spec: &SectionSpec,
    index: &MarkerIndex,
) -> Option<Region> {
    for strategy in strategies {
        if let Some(region) = strategy.resolve(spec, index) {
            tracing::debug!(
                "Section '{}' resolved by {} strategy to rows {:?}",
                spec.name,
                strategy.name(),
                region.rows
            );
            return Some(region);
        }
    }
    tracing::debug!("No region found for section '{}'", spec.name);
    None
}
