// src/main.rs
mod config;
mod extractors;
mod grid;
mod storage;
mod utils;

use std::path::PathBuf;

use clap::Parser;
use config::Vocabulary;
use extractors::{Extraction, SectionExtractor};
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the crime statistics section extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Spreadsheet or CSV dump to read (.csv, .xlsx, .xlsm, .xls, .xlsb, .ods)
    #[arg(short, long)]
    input: PathBuf,

    /// JSON vocabulary describing markers and sections (defaults to the crime statistics layout)
    #[arg(short, long)]
    vocabulary: Option<PathBuf>,

    /// Worksheet to read from a workbook (defaults to the first sheet)
    #[arg(short, long)]
    sheet: Option<String>,

    /// Output directory for extracted tables
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Fail when a marker appears more than once instead of using the first occurrence
    #[arg(long)]
    strict_markers: bool,

    /// Fall back on the vocabulary's fixed row ranges when a marker is missing
    #[arg(long)]
    fixed_rows: bool,

    /// Debug mode - save an annotated grid dump next to the outputs
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.debug);
    tracing::info!("Starting processing for args: {:?}", args);

    // 2. Resolve the vocabulary; CLI flags override the file
    let mut vocabulary = match &args.vocabulary {
        Some(path) => Vocabulary::from_json_file(path)?,
        None => {
            tracing::debug!("No vocabulary file given, using crime statistics layout");
            Vocabulary::crime_statistics()
        }
    };
    if args.strict_markers {
        vocabulary.strict_markers = true;
    }
    vocabulary.validate()?;

    // 3. Read the grid
    let grid = grid::reader::read_grid(&args.input, args.sheet.as_deref())?;
    tracing::info!("Read {} rows from {}", grid.row_count(), args.input.display());
    if grid.is_empty() {
        tracing::warn!("Input grid is empty; every section will report no data");
    }

    // 4. Extract sections and the time series
    let extractor = if args.fixed_rows {
        SectionExtractor::with_fixed_rows(vocabulary)
    } else {
        SectionExtractor::new(vocabulary)
    };
    let extraction = extractor.extract(&grid)?;

    // 5. Save outputs
    let storage = StorageManager::new(&args.output_dir)?;
    let target_dir = storage.save_all(&args.input, &grid, &extraction)?;

    if args.debug {
        let debug_path = target_dir.join("debug").join("grid_annotated.txt");
        if let Err(e) = utils::grid_debug::save_debug_grid(&grid, &extraction, &debug_path) {
            tracing::warn!("Failed to create debug grid dump: {}", e);
        }
    }

    print_summary(&extraction);
    tracing::info!("Processing finished. Outputs in {}", target_dir.display());

    Ok(())
}

/// One line per section; empty sections are reported as "no data".
fn print_summary(extraction: &Extraction) {
    for section in &extraction.sections {
        if section.is_empty() {
            println!("{:<32} no data", section.name);
        } else {
            println!(
                "{:<32} {:>4} rows  total {:>8}  dropped {}",
                section.name,
                section.rows.len(),
                section
                    .total()
                    .map_or_else(|| "overflow".to_string(), |t| t.to_string()),
                section.dropped.len()
            );
        }
    }

    let series = &extraction.time_series;
    match (series.points.first(), series.points.last()) {
        (Some(first), Some(last)) => println!(
            "{:<32} {:>4} points  {} .. {}",
            series.name,
            series.points.len(),
            first.date.date(),
            last.date.date()
        ),
        _ => println!("{:<32} no data", series.name),
    }

    for dup in &extraction.duplicate_markers {
        println!(
            "warning: marker '{}' repeated at row {} (first at row {})",
            dup.marker, dup.row, dup.first_row
        );
    }
}
