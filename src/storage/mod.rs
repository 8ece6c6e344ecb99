// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractors::{Extraction, Section, TimeSeries};
use crate::grid::RawGrid;
use crate::utils::error::StorageError;

static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Failed to compile NON_ALNUM_RE"));

/// Lowercase ASCII file name stem for a section name.
pub fn slug(name: &str) -> String {
    let lower = name.to_lowercase();
    let slug = NON_ALNUM_RE.replace_all(&lower, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Output directory for one input file: /base_dir/<input stem>/
    pub fn target_dir(&self, source: &Path) -> Result<PathBuf, StorageError> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .map(slug)
            .unwrap_or_else(|| "grid".to_string());
        let target_dir = self.base_dir.join(stem);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        Ok(target_dir)
    }

    /// Writes one section as `label,count` CSV under `sections/`.
    pub fn save_section(&self, source: &Path, section: &Section) -> Result<PathBuf, StorageError> {
        let sections_dir = self.target_dir(source)?.join("sections");
        fs::create_dir_all(&sections_dir).map_err(StorageError::IoError)?;

        let file_path = sections_dir.join(format!("{}.csv", slug(&section.name)));
        let mut writer = csv::Writer::from_path(&file_path)?;
        writer.write_record(["label", "count"])?;
        for row in &section.rows {
            writer.write_record([row.label.clone(), row.count.to_string()])?;
        }
        writer.flush()?;

        tracing::debug!("Saved section '{}' to {}", section.name, file_path.display());
        Ok(file_path)
    }

    /// Writes the time series as `date,value` CSV.
    pub fn save_time_series(&self, source: &Path, series: &TimeSeries) -> Result<PathBuf, StorageError> {
        let file_path = self.target_dir(source)?.join("time_series.csv");
        let mut writer = csv::Writer::from_path(&file_path)?;
        writer.write_record(["date", "value"])?;
        for point in &series.points {
            writer.write_record([
                point.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                point.value.to_string(),
            ])?;
        }
        writer.flush()?;

        tracing::debug!("Saved time series to {}", file_path.display());
        Ok(file_path)
    }

    /// Writes every grid row back out as header-less CSV.
    pub fn save_full_dataset(&self, source: &Path, grid: &RawGrid) -> Result<PathBuf, StorageError> {
        let file_path = self.target_dir(source)?.join("full_dataset.csv");
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&file_path)?;
        for row in grid.rows() {
            if row.is_empty() {
                // csv refuses zero-field records
                writer.write_record([""])?;
            } else {
                writer.write_record(row.iter().map(|c| c.to_string()))?;
            }
        }
        writer.flush()?;

        tracing::info!("Saved full dataset ({} rows) to {}", grid.row_count(), file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the extraction in JSON format
    pub fn save_extraction_metadata(
        &self,
        source: &Path,
        extraction: &Extraction,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.target_dir(source)?.join("extraction_meta.json");

        let sections: Vec<serde_json::Value> = extraction
            .sections
            .iter()
            .map(|s| {
                let status = if s.is_empty() { "no_data" } else { "ok" };
                serde_json::json!({
                    "name": s.name,
                    "marker": s.marker,
                    "status": status,
                    "rows": s.rows.len(),
                    "total": s.total(),
                    "region": s.region,
                    "stopped_at_marker": s.stopped_at_marker,
                    "dropped": s.dropped,
                })
            })
            .collect();

        let series = &extraction.time_series;
        let series_status = if series.is_empty() { "no_data" } else { "ok" };
        let metadata = serde_json::json!({
            "source": source.display().to_string(),
            "sections": sections,
            "time_series": {
                "name": series.name,
                "marker": series.marker,
                "status": series_status,
                "points": series.points.len(),
                "region": series.region,
                "stop": series.stop,
                "dropped": series.dropped,
            },
            "duplicate_markers": extraction.duplicate_markers,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }

    /// Writes all outputs for one extraction. Returns the output directory.
    pub fn save_all(
        &self,
        source: &Path,
        grid: &RawGrid,
        extraction: &Extraction,
    ) -> Result<PathBuf, StorageError> {
        for section in &extraction.sections {
            self.save_section(source, section)?;
        }
        self.save_time_series(source, &extraction.time_series)?;
        self.save_full_dataset(source, grid)?;
        self.save_extraction_metadata(source, extraction)?;
        self.target_dir(source)
    }
}
