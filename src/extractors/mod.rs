// src/extractors/mod.rs
pub mod coerce;
pub mod markers;
pub mod section;
pub mod timeseries;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use section::{
    clean_section,
    DroppedRow,
    Extraction,
    Section,
    SectionExtractor,
    SectionRow,
};
#[allow(unused_imports)]
pub use markers::{
    DuplicateMarker,
    FixedRowsStrategy,
    MarkerIndex,
    MarkerRegionStrategy,
    Region,
    RegionStrategy,
};
#[allow(unused_imports)]
pub use timeseries::{SeriesPoint, SeriesStop, TimeSeries};
