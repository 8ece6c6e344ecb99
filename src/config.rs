// src/config.rs
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, ExtractError};

/// Half-open row range `[start, end)` used by fixed-layout sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl From<[usize; 2]> for RowRange {
    fn from([start, end]: [usize; 2]) -> Self {
        Self { start, end }
    }
}

impl From<RowRange> for [usize; 2] {
    fn from(range: RowRange) -> Self {
        [range.start, range.end]
    }
}

/// One labelled section of the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Display name used for output files and the summary.
    pub name: String,
    /// Exact column-0 text that opens the section.
    pub marker: String,
    /// Fixed rows to fall back on when the marker is absent from the sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<RowRange>,
}

impl SectionSpec {
    pub fn new(name: &str, marker: &str) -> Self {
        Self {
            name: name.to_string(),
            marker: marker.to_string(),
            rows: None,
        }
    }

    pub fn with_rows(mut self, start: usize, end: usize) -> Self {
        self.rows = Some(RowRange { start, end });
        self
    }
}

/// The marker vocabulary and section layout for one family of sheets.
///
/// Passed into the extractor explicitly so several vocabularies can be used
/// side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub sections: Vec<SectionSpec>,
    pub time_series: SectionSpec,
    /// Extra markers that bound regions without being extracted.
    #[serde(default)]
    pub boundaries: Vec<String>,
    /// Fail on repeated markers instead of using the first occurrence.
    #[serde(default)]
    pub strict_markers: bool,
}

impl Vocabulary {
    /// Loads a vocabulary from a JSON file and validates it.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        let vocabulary: Vocabulary = serde_json::from_str(&text).map_err(|e| {
            AppError::Config(format!("Invalid vocabulary file '{}': {}", path.display(), e))
        })?;
        vocabulary.validate()?;
        tracing::info!(
            "Loaded vocabulary with {} sections from {}",
            vocabulary.sections.len(),
            path.display()
        );
        Ok(vocabulary)
    }

    /// Every marker string, in declaration order, without repeats.
    pub fn markers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.sections
            .iter()
            .map(|s| s.marker.as_str())
            .chain(std::iter::once(self.time_series.marker.as_str()))
            .chain(self.boundaries.iter().map(String::as_str))
            .filter(|m| seen.insert(*m))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.sections.is_empty() {
            return Err(ExtractError::InvalidVocabulary(
                "at least one section is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for spec in self.sections.iter().chain(std::iter::once(&self.time_series)) {
            if spec.marker.trim().is_empty() {
                return Err(ExtractError::InvalidVocabulary(format!(
                    "section '{}' has a blank marker",
                    spec.name
                )));
            }
            if spec.marker.trim() != spec.marker {
                return Err(ExtractError::InvalidVocabulary(format!(
                    "marker '{}' has surrounding whitespace",
                    spec.marker
                )));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(ExtractError::InvalidVocabulary(format!(
                    "section name '{}' is used twice",
                    spec.name
                )));
            }
            if let Some(rows) = spec.rows {
                if rows.start >= rows.end {
                    return Err(ExtractError::InvalidVocabulary(format!(
                        "section '{}' has an empty row range [{}, {})",
                        spec.name, rows.start, rows.end
                    )));
                }
            }
        }

        if self.boundaries.iter().any(|b| b.trim().is_empty()) {
            return Err(ExtractError::InvalidVocabulary(
                "boundary markers must not be blank".to_string(),
            ));
        }

        Ok(())
    }

    /// Layout of the ENG-220 crime statistics workbook. Row ranges are the
    /// positions the sheet used before it grew marker rows.
    pub fn crime_statistics() -> Self {
        Self {
            sections: vec![
                SectionSpec::new("Victim Age", "victim age").with_rows(1, 12),
                SectionSpec::new("Offender Sex", "offender sex").with_rows(13, 17),
                SectionSpec::new("Victim Sex", "Victim sex").with_rows(18, 22),
                SectionSpec::new("Offender Race", "offender race").with_rows(21, 30),
                SectionSpec::new("Offender Ethnicity", "offender ethnicity").with_rows(31, 36),
                SectionSpec::new("Victim Race", "victim race").with_rows(45, 54),
                SectionSpec::new("Victim-Offender Relationship", "victim offender relationship")
                    .with_rows(200, 220),
                SectionSpec::new("Weapons Used", "weapons").with_rows(220, 240),
                SectionSpec::new("Location Types", "location type").with_rows(240, 280),
            ],
            time_series: SectionSpec::new("Crime Reports Over Time", "dates and report numbers")
                .with_rows(66, 156),
            boundaries: Vec::new(),
            strict_markers: false,
        }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::crime_statistics()
    }
}
