//! CO2 containment accounting for reservoir simulation exports.
//!
//! Cells that ever carry CO2 are extracted from grid, init and restart
//! exports, converted to mass or volume, and summed per report date inside
//! a containment polygon, outside it, and inside an optional hazardous
//! polygon.

pub mod calculation;
pub mod config;
pub mod containment;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod polygon;
pub mod reader;
pub mod schema;
pub mod source;
pub mod table;

#[cfg(feature = "python")]
mod python;

pub use calculation::{CalculationType, Co2Data, Co2DataAtTimeStep, SimulatorLayout, Units};
pub use config::{ClassifierKind, Co2Config};
pub use containment::{calculate_co2_containment, ContainedCo2, Location, Phase};
pub use error::{Co2Error, Co2Result};
pub use extraction::{extract_source_data, RawCellData};
pub use pipeline::{calculate_out_of_bounds_co2, check_input};
pub use polygon::{read_polygon, Polygon};
pub use reader::InputFiles;
pub use source::{Property, SourceData};
pub use table::{
    calculate_from_co2_data, construct_containment_table, merge_date_rows, write_output,
    ContainmentOutput,
};
