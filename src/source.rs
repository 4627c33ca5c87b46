use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;

use crate::error::{Co2Error, Co2Result};

/// Restart properties carried per report date.
///
/// PFlotran exports densities (`DWAT`, `DGAS`) and mole fractions (`AMFG`,
/// `YMFG`). Eclipse exports molar densities (`BWAT`, `BGAS`), mole fractions
/// (`XMF2`, `YMF2`) and the pore volume per date (`RPORV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    Swat,
    Dwat,
    Sgas,
    Dgas,
    Amfg,
    Ymfg,
    Rporv,
    Bwat,
    Bgas,
    Xmf2,
    Ymf2,
}

impl Property {
    pub const ALL: [Property; 11] = [
        Property::Swat,
        Property::Dwat,
        Property::Sgas,
        Property::Dgas,
        Property::Amfg,
        Property::Ymfg,
        Property::Rporv,
        Property::Bwat,
        Property::Bgas,
        Property::Xmf2,
        Property::Ymf2,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            Property::Swat => "SWAT",
            Property::Dwat => "DWAT",
            Property::Sgas => "SGAS",
            Property::Dgas => "DGAS",
            Property::Amfg => "AMFG",
            Property::Ymfg => "YMFG",
            Property::Rporv => "RPORV",
            Property::Bwat => "BWAT",
            Property::Bgas => "BGAS",
            Property::Xmf2 => "XMF2",
            Property::Ymf2 => "YMF2",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Property {
    type Err = Co2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Property::ALL
            .into_iter()
            .find(|p| p.keyword() == upper)
            .ok_or_else(|| Co2Error::InvalidData(format!("Unknown restart property: {s}")))
    }
}

/// Per-date per-cell arrays, keyed by property.
pub type PropertySeries = BTreeMap<Property, Vec<Array1<f64>>>;

/// Fail with every absent property listed at once.
pub fn require_properties(series: &PropertySeries, required: &[Property]) -> Co2Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|p| !series.contains_key(*p))
        .map(|p| p.keyword().to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Co2Error::MissingProperties(missing))
    }
}

/// Grid cell coordinates, volumes and restart properties for the cells
/// that carry CO2 at some report date.
///
/// All per-cell arrays share one cell ordering. Construct through
/// [`SourceData::new`], which checks the shape invariants.
#[derive(Debug, Clone)]
pub struct SourceData {
    x: Array1<f64>,
    y: Array1<f64>,
    poro: Array1<f64>,
    volumes: Array1<f64>,
    porv: Option<Array1<f64>>,
    dates: Vec<String>,
    properties: PropertySeries,
    zone: Option<Vec<String>>,
}

impl SourceData {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x: Array1<f64>,
        y: Array1<f64>,
        poro: Array1<f64>,
        volumes: Array1<f64>,
        porv: Option<Array1<f64>>,
        dates: Vec<String>,
        properties: PropertySeries,
        zone: Option<Vec<String>>,
    ) -> Co2Result<Self> {
        let n = x.len();
        let mut lengths = vec![("y", y.len()), ("poro", poro.len()), ("volumes", volumes.len())];
        if let Some(porv) = &porv {
            lengths.push(("porv", porv.len()));
        }
        if let Some(zone) = &zone {
            lengths.push(("zone", zone.len()));
        }
        for (name, len) in lengths {
            if len != n {
                return Err(Co2Error::Validation(format!(
                    "{name} has {len} cells, expected {n}"
                )));
            }
        }

        for (property, arrays) in &properties {
            if arrays.len() != dates.len() {
                return Err(Co2Error::Validation(format!(
                    "{property} has {} time steps, expected {}",
                    arrays.len(),
                    dates.len()
                )));
            }
            if let Some(bad) = arrays.iter().position(|a| a.len() != n) {
                return Err(Co2Error::Validation(format!(
                    "{property} at {} has {} cells, expected {n}",
                    dates[bad],
                    arrays[bad].len()
                )));
            }
        }

        Ok(Self {
            x,
            y,
            poro,
            volumes,
            porv,
            dates,
            properties,
            zone,
        })
    }

    pub fn n_cells(&self) -> usize {
        self.x.len()
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn poro(&self) -> &Array1<f64> {
        &self.poro
    }

    pub fn volumes(&self) -> &Array1<f64> {
        &self.volumes
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn zone(&self) -> Option<&[String]> {
        self.zone.as_deref()
    }

    pub fn has_property(&self, property: Property) -> bool {
        self.properties.contains_key(&property)
    }

    pub fn require(&self, required: &[Property]) -> Co2Result<()> {
        require_properties(&self.properties, required)
    }

    /// Arrays of `property`, one per date.
    pub fn series(&self, property: Property) -> Co2Result<&[Array1<f64>]> {
        self.properties
            .get(&property)
            .map(Vec::as_slice)
            .ok_or_else(|| Co2Error::MissingProperties(vec![property.keyword().to_string()]))
    }

    /// Pore volume per cell: `PORV` when exported, otherwise bulk volume times porosity.
    pub fn pore_volumes(&self) -> Array1<f64> {
        match &self.porv {
            Some(porv) => porv.clone(),
            None => &self.volumes * &self.poro,
        }
    }
}
