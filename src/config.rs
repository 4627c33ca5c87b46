//! Run configuration for the CO2 calculations.
//!
//! Every value has a documented default, so an empty TOML file (or no file
//! at all) reproduces the standard behaviour:
//!
//! ```toml
//! co2_molar_mass = 44.0
//! water_molar_mass = 18.0
//! water_density = 1000.0
//! sgas_threshold = 1e-16
//! amfg_threshold = 1e-16
//! point_classifier = "prepared"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Co2Result;

pub const DEFAULT_CO2_MOLAR_MASS: f64 = 44.0;
pub const DEFAULT_WATER_MOLAR_MASS: f64 = 18.0;
pub const DEFAULT_WATER_DENSITY: f64 = 1000.0;
pub const DEFAULT_GAS_THRESHOLD: f64 = 1e-16;

/// Which point-in-polygon implementation classifies grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Y-band filtered, pre-computed edges, evaluated with `ndarray::Zip`.
    #[default]
    Prepared,
    /// Plain per-point ray casting.
    Reference,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Co2Config {
    /// Molar mass of CO2 (g/mol)
    pub co2_molar_mass: f64,
    /// Molar mass of H2O (g/mol)
    pub water_molar_mass: f64,
    /// Pure-water density (kg/m3) used when no CO2-free cell is available
    pub water_density: f64,
    /// Cells with |SGAS| below this at every date may be gas-less
    pub sgas_threshold: f64,
    /// Cells with |AMFG| below this at every date may be gas-less
    pub amfg_threshold: f64,
    pub point_classifier: ClassifierKind,
}

impl Default for Co2Config {
    fn default() -> Self {
        Self {
            co2_molar_mass: DEFAULT_CO2_MOLAR_MASS,
            water_molar_mass: DEFAULT_WATER_MOLAR_MASS,
            water_density: DEFAULT_WATER_DENSITY,
            sgas_threshold: DEFAULT_GAS_THRESHOLD,
            amfg_threshold: DEFAULT_GAS_THRESHOLD,
            point_classifier: ClassifierKind::default(),
        }
    }
}

impl Co2Config {
    pub fn from_toml_str(content: &str) -> Co2Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: &Path) -> Co2Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
