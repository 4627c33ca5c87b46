use log::info;

use crate::calculation::{calculate_co2_data_from_source_data, CalculationType, Co2Data};
use crate::config::Co2Config;
use crate::error::Co2Result;
use crate::extraction::extract_source_data;
use crate::polygon::{read_polygon, Polygon};
use crate::reader::{read_raw_cell_data, InputFiles};
use crate::table::{calculate_from_co2_data, ContainmentOutput};

/// Validate the calculation type and that every input file exists.
pub fn check_input(calc_type_input: &str, files: &InputFiles) -> Co2Result<CalculationType> {
    let calc_type = calc_type_input.parse()?;
    files.check_exist()?;
    Ok(calc_type)
}

/// Read the exports in `files` and compute CO2 per cell and date.
pub fn calculate_co2(
    files: &InputFiles,
    calc_type: CalculationType,
    config: &Co2Config,
) -> Co2Result<Co2Data> {
    let raw = read_raw_cell_data(files)?;
    let source = extract_source_data(raw, config)?;
    let co2_data = calculate_co2_data_from_source_data(&source, calc_type, config)?;
    info!("Done calculating CO2 data for all active grid cells");
    Ok(co2_data)
}

fn optional_polygon(path: Option<&std::path::Path>) -> Co2Result<Option<Polygon>> {
    path.map(read_polygon).transpose()
}

/// Sum of CO2 mass or volume at each report date, split by location,
/// phase and, when a zone file is given, zone.
pub fn calculate_out_of_bounds_co2(
    files: &InputFiles,
    calc_type_input: &str,
    compact: bool,
    config: &Co2Config,
) -> Co2Result<ContainmentOutput> {
    let calc_type = check_input(calc_type_input, files)?;
    let co2_data = calculate_co2(files, calc_type, config)?;
    let containment = optional_polygon(files.containment_polygon.as_deref())?;
    let hazardous = optional_polygon(files.hazardous_polygon.as_deref())?;
    calculate_from_co2_data(
        &co2_data,
        containment.as_ref(),
        hazardous.as_ref(),
        compact,
        calc_type_input,
        config,
    )
}
