// src/extractors/section.rs

// --- Imports ---
use serde::Serialize;

use crate::config::{SectionSpec, Vocabulary};
use crate::extractors::coerce;
use crate::extractors::markers::{
    resolve_region, DuplicateMarker, FixedRowsStrategy, MarkerIndex, MarkerRegionStrategy, Region,
    RegionStrategy,
};
use crate::extractors::timeseries::{extract_series, TimeSeries};
use crate::grid::RawGrid;
use crate::utils::error::ExtractError;

// --- Data Structures ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRow {
    pub label: String,
    pub count: i64,
}

/// A row left out of a table because its value cell failed coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRow {
    pub row: usize,
    pub label: String,
    pub reason: String,
}

/// Cleaned (label, count) table for one section of the sheet.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub name: String,
    pub marker: String,
    pub region: Option<Region>,
    pub rows: Vec<SectionRow>,
    pub dropped: Vec<DroppedRow>,
    /// Row where another marker cut the region short.
    pub stopped_at_marker: Option<usize>,
}

impl Section {
    fn empty(spec: &SectionSpec, region: Option<Region>) -> Self {
        Self {
            name: spec.name.clone(),
            marker: spec.marker.clone(),
            region,
            rows: Vec::new(),
            dropped: Vec::new(),
            stopped_at_marker: None,
        }
    }

    /// An empty section should be shown as "no data", not as an empty chart.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all counts, or `None` if it does not fit in an `i64`.
    pub fn total(&self) -> Option<i64> {
        self.rows
            .iter()
            .try_fold(0i64, |acc, r| acc.checked_add(r.count))
    }
}

/// Every section of one sheet plus its time series.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub sections: Vec<Section>,
    pub time_series: TimeSeries,
    pub duplicate_markers: Vec<DuplicateMarker>,
    /// The marker index every region was resolved against.
    #[serde(skip)]
    pub index: MarkerIndex,
}

impl Extraction {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// Cleans the rows of `region` into a section table.
///
/// Blank labels are skipped, a marker label ends the region, and rows whose
/// count does not coerce are dropped after the pass.
pub fn clean_section(
    grid: &RawGrid,
    index: &MarkerIndex,
    spec: &SectionSpec,
    region: Option<Region>,
) -> Section {
    let mut section = Section::empty(spec, region.clone());
    let Some(region) = region else {
        return section;
    };

    let mut candidates = Vec::with_capacity(region.len());
    for row in region.rows.clone() {
        let label_cell = grid.cell(row, 0);
        if index.is_marker_cell(label_cell) {
            tracing::debug!("Section '{}' cut short by marker at row {}", spec.name, row);
            section.stopped_at_marker = Some(row);
            break;
        }
        let Some(label) = label_cell.label() else {
            tracing::trace!("Skipping blank label at row {}", row);
            continue;
        };
        candidates.push((row, label, coerce::to_count(grid.cell(row, 1))));
    }

    for (row, label, count) in candidates {
        match count {
            Ok(count) => section.rows.push(SectionRow { label, count }),
            Err(reason) => {
                tracing::debug!("Dropping row {} '{}' from '{}': {}", row, label, spec.name, reason);
                section.dropped.push(DroppedRow {
                    row,
                    label,
                    reason: reason.to_string(),
                });
            }
        }
    }

    section
}

// --- Main Extractor Structure ---
pub struct SectionExtractor {
    vocabulary: Vocabulary,
    strategies: Vec<Box<dyn RegionStrategy>>,
}

impl SectionExtractor {
    /// Marker-only extractor: a section whose marker is missing is empty.
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            strategies: vec![Box::new(MarkerRegionStrategy)],
        }
    }

    /// Falls back on each section's configured fixed rows when its marker
    /// is not located.
    pub fn with_fixed_rows(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            strategies: vec![Box::new(MarkerRegionStrategy), Box::new(FixedRowsStrategy)],
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Locates markers once, then cleans every section and the time series.
    pub fn extract(&self, grid: &RawGrid) -> Result<Extraction, ExtractError> {
        let markers = self.vocabulary.markers();
        tracing::info!(
            "Extracting {} sections from {} rows using {} markers",
            self.vocabulary.sections.len(),
            grid.row_count(),
            markers.len()
        );

        let index = MarkerIndex::locate(grid, &markers);
        if self.vocabulary.strict_markers {
            if let Some(dup) = index.duplicates().first() {
                return Err(ExtractError::DuplicateMarker {
                    marker: dup.marker.clone(),
                    first_row: dup.first_row,
                    row: dup.row,
                });
            }
        }

        let sections = self
            .vocabulary
            .sections
            .iter()
            .map(|spec| {
                let region = resolve_region(&self.strategies, spec, &index);
                let section = clean_section(grid, &index, spec, region);
                if section.is_empty() {
                    tracing::info!("Section '{}': no data", section.name);
                } else {
                    tracing::info!(
                        "Section '{}': {} rows, {} dropped",
                        section.name,
                        section.rows.len(),
                        section.dropped.len()
                    );
                }
                section
            })
            .collect();

        let series_spec = &self.vocabulary.time_series;
        let series_region = resolve_region(&self.strategies, series_spec, &index);
        let time_series = extract_series(
            grid,
            &index,
            &series_spec.name,
            &series_spec.marker,
            series_region,
        );

        Ok(Extraction {
            sections,
            time_series,
            duplicate_markers: index.duplicates().to_vec(),
            index,
        })
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    fn text(s: &str) -> Cell {
        Cell::from_text(s)
    }

    fn num(n: f64) -> Cell {
        Cell::Numeric(n)
    }

    fn vocabulary(markers: &[&str], series: &str) -> Vocabulary {
        Vocabulary {
            sections: markers.iter().map(|m| SectionSpec::new(m, m)).collect(),
            time_series: SectionSpec::new("Reports", series),
            boundaries: Vec::new(),
            strict_markers: false,
        }
    }

    fn labels(section: &Section) -> Vec<(&str, i64)> {
        section.rows.iter().map(|r| (r.label.as_str(), r.count)).collect()
    }

    #[test]
    fn test_victim_age_scenario() {
        let grid = RawGrid::new(vec![
            vec![text("victim age")],
            vec![text("0-9"), text("100")],
            vec![text("10-19"), text("200")],
            vec![text("offender sex"), Cell::Empty],
        ]);
        let extraction = SectionExtractor::new(vocabulary(&["victim age", "offender sex"], "dates"))
            .extract(&grid)
            .unwrap();

        let age = extraction.section("victim age").unwrap();
        assert_eq!(labels(age), vec![("0-9", 100), ("10-19", 200)]);
        assert_eq!(age.region.as_ref().unwrap().rows, 1..3);
        assert!(extraction.section("offender sex").unwrap().is_empty());
    }

    #[test]
    fn test_uncoercible_count_is_dropped() {
        let grid = RawGrid::new(vec![
            vec![text("victim age")],
            vec![text("0-9"), num(100.0)],
            vec![text("10-19"), text("N/A")],
            vec![text("20-29")],
            vec![text("30-39"), num(4.0)],
        ]);
        let extraction = SectionExtractor::new(vocabulary(&["victim age"], "dates"))
            .extract(&grid)
            .unwrap();
        let age = extraction.section("victim age").unwrap();

        assert_eq!(labels(age), vec![("0-9", 100), ("30-39", 4)]);
        let dropped: Vec<usize> = age.dropped.iter().map(|d| d.row).collect();
        assert_eq!(dropped, vec![2, 3]);
        assert_eq!(age.total(), Some(104));
    }

    #[test]
    fn test_blank_labels_are_skipped_not_stopping() {
        let grid = RawGrid::new(vec![
            vec![text("Victim sex")],
            vec![text("Male"), num(10.0)],
            vec![Cell::Empty, num(99.0)],
            vec![text("  "), num(99.0)],
            vec![text("Female"), num(12.0)],
            vec![text("Male"), num(1.0)],
        ]);
        let extraction = SectionExtractor::new(vocabulary(&["Victim sex"], "dates"))
            .extract(&grid)
            .unwrap();
        let sex = extraction.section("Victim sex").unwrap();

        // Duplicate labels stay as separate rows.
        assert_eq!(labels(sex), vec![("Male", 10), ("Female", 12), ("Male", 1)]);
        let region_len = sex.region.as_ref().unwrap().len();
        assert!(sex.rows.len() <= region_len - 2);
    }

    #[test]
    fn test_repeated_marker_stops_section_defensively() {
        let grid = RawGrid::new(vec![
            vec![text("victim age")],
            vec![text("0-9"), num(1.0)],
            vec![text("offender sex")],
            vec![text("Male"), num(2.0)],
            vec![text("victim age")],
            vec![text("Female"), num(3.0)],
        ]);
        let vocab = vocabulary(&["offender sex", "victim age"], "dates");
        let extraction = SectionExtractor::new(vocab).extract(&grid).unwrap();

        let sex = extraction.section("offender sex").unwrap();
        assert_eq!(labels(sex), vec![("Male", 2)]);
        assert_eq!(sex.stopped_at_marker, Some(4));
        assert_eq!(extraction.duplicate_markers.len(), 1);

        let markers = ["offender sex", "victim age", "dates"];
        for section in &extraction.sections {
            assert!(section.rows.iter().all(|r| !markers.contains(&r.label.as_str())));
        }
    }

    #[test]
    fn test_strict_markers_reject_duplicates() {
        let grid = RawGrid::new(vec![
            vec![text("victim age")],
            vec![text("0-9"), num(1.0)],
            vec![text("victim age")],
        ]);
        let mut vocab = vocabulary(&["victim age"], "dates");
        vocab.strict_markers = true;

        let err = SectionExtractor::new(vocab).extract(&grid).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::DuplicateMarker { first_row: 0, row: 2, .. }
        ));
    }

    #[test]
    fn test_missing_marker_uses_fixed_rows_or_is_empty() {
        let grid = RawGrid::new(vec![
            vec![text("Age")],
            vec![text("0-9"), num(5.0)],
            vec![text("10-19"), num(6.0)],
        ]);
        let mut vocab = vocabulary(&["victim age"], "dates");
        vocab.sections[0].rows = Some(crate::config::RowRange { start: 1, end: 3 });

        let fixed = SectionExtractor::with_fixed_rows(vocab.clone()).extract(&grid).unwrap();
        assert_eq!(
            labels(fixed.section("victim age").unwrap()),
            vec![("0-9", 5), ("10-19", 6)]
        );

        let markers_only = SectionExtractor::new(vocab).extract(&grid).unwrap();
        let section = markers_only.section("victim age").unwrap();
        assert!(section.is_empty());
        assert!(section.region.is_none());
    }

    #[test]
    fn test_boundary_markers_close_regions() {
        let grid = RawGrid::new(vec![
            vec![text("weapons")],
            vec![text("Handgun"), num(40.0)],
            vec![text("notes")],
            vec![text("source: FBI"), num(2024.0)],
        ]);
        let mut vocab = vocabulary(&["weapons"], "dates");
        vocab.boundaries.push("notes".to_string());

        let extraction = SectionExtractor::new(vocab).extract(&grid).unwrap();
        assert_eq!(labels(extraction.section("weapons").unwrap()), vec![("Handgun", 40)]);
    }

    #[test]
    fn test_numeric_labels_and_time_series_together() {
        let grid = RawGrid::new(vec![
            vec![text("year")],
            vec![num(2019.0), num(10.0)],
            vec![text("dates")],
            vec![text("2020-01"), num(3.0)],
            vec![text("2020-02"), num(4.0)],
        ]);
        let extraction = SectionExtractor::new(vocabulary(&["year"], "dates"))
            .extract(&grid)
            .unwrap();

        assert_eq!(labels(extraction.section("year").unwrap()), vec![("2019", 10)]);
        assert_eq!(extraction.time_series.points.len(), 2);
    }

    #[test]
    fn test_total_reports_overflow_instead_of_panicking() {
        let grid = RawGrid::new(vec![
            vec![text("victim age")],
            vec![text("a"), text("9000000000000000000")],
            vec![text("b"), text("9000000000000000000")],
        ]);
        let extraction = SectionExtractor::new(vocabulary(&["victim age"], "dates"))
            .extract(&grid)
            .unwrap();
        let age = extraction.section("victim age").unwrap();

        assert_eq!(age.rows.len(), 2);
        assert_eq!(age.rows[0].count, 9_000_000_000_000_000_000);
        assert_eq!(age.total(), None);
    }

    #[test]
    fn test_default_extractor_leaves_miscased_marker_empty() {
        let mut rows = vec![vec![text("Victim Age")]];
        for i in 0..40 {
            rows.push(vec![text(&format!("{}-{}", i * 10, i * 10 + 9)), num(i as f64)]);
        }
        let grid = RawGrid::new(rows);

        let extraction = SectionExtractor::new(Vocabulary::crime_statistics())
            .extract(&grid)
            .unwrap();
        let age = extraction.section("Victim Age").unwrap();
        assert!(age.is_empty());
        assert!(age.region.is_none());

        let fallback = SectionExtractor::with_fixed_rows(Vocabulary::crime_statistics())
            .extract(&grid)
            .unwrap();
        assert_eq!(fallback.section("Victim Age").unwrap().rows.len(), 11);
    }

    #[test]
    fn test_extraction_keeps_the_marker_index_it_used() {
        let grid = RawGrid::new(vec![
            vec![text("weapons")],
            vec![text("Knife"), num(3.0)],
            vec![text("dates")],
        ]);
        let extraction = SectionExtractor::new(vocabulary(&["weapons"], "dates"))
            .extract(&grid)
            .unwrap();
        assert_eq!(extraction.index.row_of("weapons"), Some(0));
        assert_eq!(extraction.index.row_of("dates"), Some(2));
    }

    #[test]
    fn test_numeric_marker_is_located() {
        let grid = RawGrid::new(vec![
            vec![num(2019.0)],
            vec![text("Burglary"), num(12.0)],
            vec![num(2020.0)],
            vec![text("Burglary"), num(9.0)],
        ]);
        let extraction = SectionExtractor::new(vocabulary(&["2019", "2020"], "dates"))
            .extract(&grid)
            .unwrap();

        assert_eq!(labels(extraction.section("2019").unwrap()), vec![("Burglary", 12)]);
        assert_eq!(labels(extraction.section("2020").unwrap()), vec![("Burglary", 9)]);
    }
}
