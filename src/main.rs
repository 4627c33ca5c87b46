//! Calculates the amount of CO2 inside and outside a containment polygon,
//! split by phase and optionally by zone, and writes the result as CSV.
//!
//! # Usage
//!
//! ```bash
//! co2_containment model/CASE.EGRID.csv out/containment.csv \
//!   --containment_polygon polygons/containment.csv \
//!   --calc_type_input actual_volume
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};

use co2_containment::error::Co2Result;
use co2_containment::table::write_output;
use co2_containment::{calculate_out_of_bounds_co2, CalculationType, Co2Config, InputFiles};

/// CO2 containment calculation
#[derive(Parser, Debug)]
#[command(name = "co2_containment")]
#[command(about = "Calculate CO2 mass or volume inside and outside polygon boundaries")]
struct Args {
    /// Grid export (.EGRID.csv) with cell centres and volumes
    grid: PathBuf,

    /// Output filename
    outfile: PathBuf,

    /// Polygon that determines the bounds of the containment area.
    /// Count all CO2 as contained if not provided.
    #[arg(long = "containment_polygon")]
    containment_polygon: Option<PathBuf>,

    /// Polygon that determines the bounds of the hazardous area
    #[arg(long = "hazardous_polygon")]
    hazardous_polygon: Option<PathBuf>,

    /// Restart export. Same base name as grid if not provided
    #[arg(long)]
    unrst: Option<PathBuf>,

    /// Init export. Same base name as grid if not provided
    #[arg(long)]
    init: Option<PathBuf>,

    /// File containing zone information
    #[arg(long)]
    zonefile: Option<PathBuf>,

    /// Write the output to a single file as compact as possible
    #[arg(long)]
    compact: bool,

    /// CO2 calculation options: mass / cell_volume / actual_volume / actual_volume_simplified
    #[arg(long = "calc_type_input", default_value = "mass")]
    calc_type_input: String,

    /// TOML file overriding molar masses, thresholds and the point classifier
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Co2Result<()> {
    let config = match &args.config {
        Some(path) => Co2Config::from_toml_file(path)?,
        None => Co2Config::default(),
    };
    let files = InputFiles {
        zone: args.zonefile,
        containment_polygon: args.containment_polygon,
        hazardous_polygon: args.hazardous_polygon,
        ..InputFiles::from_grid(args.grid, args.unrst, args.init)
    };
    let calc_type: CalculationType = args.calc_type_input.parse()?;

    let output = calculate_out_of_bounds_co2(&files, &args.calc_type_input, args.compact, &config)?;
    for path in write_output(&output, &args.outfile, calc_type)? {
        info!("Done. Output written to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialise logging: {e}");
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
