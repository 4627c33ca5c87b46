use std::collections::BTreeMap;
use std::path::PathBuf;

use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::config::Co2Config;
use crate::pipeline;
use crate::reader::InputFiles;
use crate::schema;
use crate::table::ContainmentOutput;

#[derive(IntoPyObject)]
enum PyContainmentOutput {
    Table(PyDataFrame),
    Zoned(BTreeMap<String, PyDataFrame>),
}

impl From<ContainmentOutput> for PyContainmentOutput {
    fn from(output: ContainmentOutput) -> Self {
        match output {
            ContainmentOutput::Compact(df) | ContainmentOutput::Merged(df) => {
                PyContainmentOutput::Table(PyDataFrame(df))
            }
            ContainmentOutput::Zoned(zones) => PyContainmentOutput::Zoned(
                zones
                    .into_iter()
                    .map(|(zone, df)| (zone, PyDataFrame(df)))
                    .collect(),
            ),
        }
    }
}

/// Sum CO2 at each report date, split by location and phase.
///
/// Returns a DataFrame, or a dict of DataFrames keyed by zone when a zone
/// file is given and `compact` is false.
#[pyfunction]
#[pyo3(signature = (
    grid_file,
    compact=false,
    calc_type_input="mass",
    unrst_file=None,
    init_file=None,
    containment_polygon=None,
    hazardous_polygon=None,
    zone_file=None,
    config_file=None,
))]
#[allow(clippy::too_many_arguments)]
fn calculate_out_of_bounds_co2(
    grid_file: PathBuf,
    compact: bool,
    calc_type_input: &str,
    unrst_file: Option<PathBuf>,
    init_file: Option<PathBuf>,
    containment_polygon: Option<PathBuf>,
    hazardous_polygon: Option<PathBuf>,
    zone_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> PyResult<PyContainmentOutput> {
    let config = match config_file {
        Some(path) => Co2Config::from_toml_file(&path)?,
        None => Co2Config::default(),
    };
    let files = InputFiles {
        zone: zone_file,
        containment_polygon,
        hazardous_polygon,
        ..InputFiles::from_grid(grid_file, unrst_file, init_file)
    };
    let output = pipeline::calculate_out_of_bounds_co2(&files, calc_type_input, compact, &config)?;
    Ok(output.into())
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Containment table
    let containment = PyModule::new(m.py(), "containment")?;
    containment.add("DATE", schema::containment::DATE)?;
    containment.add("AMOUNT", schema::containment::AMOUNT)?;
    containment.add("PHASE", schema::containment::PHASE)?;
    containment.add("LOCATION", schema::containment::LOCATION)?;
    containment.add("ZONE", schema::containment::ZONE)?;
    containment.add("TOTAL", schema::containment::TOTAL)?;
    m.add_submodule(&containment)?;

    // Phase
    let phase = PyModule::new(m.py(), "phase")?;
    phase.add("GAS", schema::phase::GAS)?;
    phase.add("AQUEOUS", schema::phase::AQUEOUS)?;
    phase.add("UNDEFINED", schema::phase::UNDEFINED)?;
    m.add_submodule(&phase)?;

    // Location
    let location = PyModule::new(m.py(), "location")?;
    location.add("CONTAINED", schema::location::CONTAINED)?;
    location.add("OUTSIDE", schema::location::OUTSIDE)?;
    location.add("HAZARDOUS", schema::location::HAZARDOUS)?;
    m.add_submodule(&location)?;

    Ok(())
}

/// Must match the `[lib]` name.
#[pymodule]
fn co2_containment(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(calculate_out_of_bounds_co2, m)?)?;
    add_schema_exports(m)?;
    Ok(())
}
