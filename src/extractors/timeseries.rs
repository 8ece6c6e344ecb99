// src/extractors/timeseries.rs
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::extractors::coerce;
use crate::extractors::markers::{MarkerIndex, Region};
use crate::extractors::section::DroppedRow;
use crate::grid::RawGrid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDateTime,
    pub value: f64,
}

/// Why the series ended where it did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SeriesStop {
    /// A marker row closed the region.
    Marker { row: usize },
    /// Column 0 stopped parsing as a date; later rows are not recovered.
    NonDate { row: usize },
    /// Ran to the end of the region.
    EndOfRegion,
    /// Neither the marker nor a fixed row range was available.
    NotLocated,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    pub name: String,
    pub marker: String,
    pub region: Option<Region>,
    pub points: Vec<SeriesPoint>,
    pub dropped: Vec<DroppedRow>,
    pub stop: SeriesStop,
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Reads dated values from the rows of `region`.
///
/// The region is assumed dense: the first row whose column 0 is not a date
/// ends the series, even if dated rows follow.
pub fn extract_series(
    grid: &RawGrid,
    index: &MarkerIndex,
    name: &str,
    marker: &str,
    region: Option<Region>,
) -> TimeSeries {
    let mut series = TimeSeries {
        name: name.to_string(),
        marker: marker.to_string(),
        region: region.clone(),
        points: Vec::new(),
        dropped: Vec::new(),
        stop: SeriesStop::NotLocated,
    };
    let Some(region) = region else {
        tracing::info!("Time series '{}': marker '{}' not found, no data", name, marker);
        return series;
    };

    series.stop = SeriesStop::EndOfRegion;
    for row in region.rows.clone() {
        let date_cell = grid.cell(row, 0);
        if index.is_marker_cell(date_cell) {
            tracing::debug!("Time series '{}' closed by marker at row {}", name, row);
            series.stop = SeriesStop::Marker { row };
            break;
        }

        let date = match coerce::to_date(date_cell) {
            Ok(date) => date,
            Err(e) => {
                tracing::debug!("Time series '{}' ends at row {}: {}", name, row, e);
                series.stop = SeriesStop::NonDate { row };
                break;
            }
        };

        match coerce::to_number(grid.cell(row, 1)) {
            Ok(value) => series.points.push(SeriesPoint { date, value }),
            Err(reason) => {
                tracing::debug!("Dropping time series row {} ({}): {}", row, date, reason);
                series.dropped.push(DroppedRow {
                    row,
                    label: date.to_string(),
                    reason: reason.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Time series '{}': {} points, {} dropped, stop {:?}",
        name,
        series.points.len(),
        series.dropped.len(),
        series.stop
    );
    series
}
