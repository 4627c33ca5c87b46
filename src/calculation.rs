use std::fmt;
use std::str::FromStr;

use log::info;
use ndarray::{Array1, Zip};

use crate::config::Co2Config;
use crate::error::{Co2Error, Co2Result};
use crate::source::{Property, SourceData};

/// Which physical quantity of CO2 is computed per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalculationType {
    Mass,
    CellVolume,
    ActualVolume,
    ActualVolumeSimplified,
}

impl CalculationType {
    pub const ALL: [CalculationType; 4] = [
        CalculationType::Mass,
        CalculationType::CellVolume,
        CalculationType::ActualVolume,
        CalculationType::ActualVolumeSimplified,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CalculationType::Mass => "MASS",
            CalculationType::CellVolume => "CELL_VOLUME",
            CalculationType::ActualVolume => "ACTUAL_VOLUME",
            CalculationType::ActualVolumeSimplified => "ACTUAL_VOLUME_SIMPLIFIED",
        }
    }

    pub fn units(&self) -> Units {
        match self {
            CalculationType::Mass => Units::Kg,
            _ => Units::M3,
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CalculationType {
    type Err = Co2Error;

    /// Case-insensitive, e.g. `"mass"` or `"ACTUAL_VOLUME"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_uppercase();
        CalculationType::ALL
            .into_iter()
            .find(|c| c.name() == key)
            .ok_or(Co2Error::InvalidCalculationType(key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Kg,
    M3,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Kg => "kg",
            Units::M3 => "m3",
        }
    }
}

/// Which simulator's property set the restart data follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulatorLayout {
    /// `DWAT`/`DGAS` densities and `AMFG`/`YMFG` mole fractions.
    Pflotran,
    /// `BWAT`/`BGAS` molar densities, `XMF2`/`YMF2` mole fractions and `RPORV`.
    Eclipse,
}

impl SimulatorLayout {
    /// Restart properties `calc_type` reads in this layout.
    pub fn required_properties(&self, calc_type: CalculationType) -> &'static [Property] {
        use CalculationType::*;
        use Property::*;
        match (self, calc_type) {
            (SimulatorLayout::Pflotran, Mass | ActualVolume) => {
                &[Swat, Dwat, Sgas, Dgas, Amfg, Ymfg]
            }
            (SimulatorLayout::Pflotran, CellVolume) => &[Sgas, Amfg],
            (SimulatorLayout::Pflotran, ActualVolumeSimplified) => &[Sgas, Amfg, Ymfg],
            (SimulatorLayout::Eclipse, Mass | ActualVolume) => {
                &[Sgas, Rporv, Bwat, Bgas, Xmf2, Ymf2]
            }
            (SimulatorLayout::Eclipse, CellVolume) => &[Sgas, Xmf2],
            (SimulatorLayout::Eclipse, ActualVolumeSimplified) => &[Sgas, Rporv, Xmf2, Ymf2],
        }
    }

    pub fn aqueous_mole_fraction(&self) -> Property {
        match self {
            SimulatorLayout::Pflotran => Property::Amfg,
            SimulatorLayout::Eclipse => Property::Xmf2,
        }
    }

    pub fn gas_mole_fraction(&self) -> Property {
        match self {
            SimulatorLayout::Pflotran => Property::Ymfg,
            SimulatorLayout::Eclipse => Property::Ymf2,
        }
    }

    /// PFlotran when its full property set is present, otherwise Eclipse.
    /// With neither complete, the error lists what is missing from the
    /// layout the data resembles (Eclipse only when `XMF2` is present
    /// without `AMFG`).
    pub fn detect(source: &SourceData, calc_type: CalculationType) -> Co2Result<Self> {
        let pflotran = source.require(SimulatorLayout::Pflotran.required_properties(calc_type));
        let eclipse = source.require(SimulatorLayout::Eclipse.required_properties(calc_type));
        let looks_like_eclipse =
            source.has_property(Property::Xmf2) && !source.has_property(Property::Amfg);
        match (pflotran, eclipse) {
            (Ok(()), _) => Ok(SimulatorLayout::Pflotran),
            (_, Ok(())) => Ok(SimulatorLayout::Eclipse),
            (Err(e), _) if !looks_like_eclipse => Err(e),
            (_, Err(e)) => Err(e),
        }
    }
}

impl fmt::Display for SimulatorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorLayout::Pflotran => f.write_str("PFlotran"),
            SimulatorLayout::Eclipse => f.write_str("Eclipse"),
        }
    }
}

/// Amount of CO2 per cell at one report date.
#[derive(Debug, Clone, PartialEq)]
pub struct Co2DataAtTimeStep {
    pub date: String,
    pub gas_phase: Array1<f64>,
    pub aqu_phase: Array1<f64>,
    /// Only populated for [`CalculationType::CellVolume`].
    pub volume_coverage: Array1<f64>,
}

impl Co2DataAtTimeStep {
    pub fn total_weight(&self) -> Array1<f64> {
        &self.gas_phase + &self.aqu_phase
    }
}

/// Amount of CO2 at each relevant cell, one record per report date.
#[derive(Debug, Clone)]
pub struct Co2Data {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub data_list: Vec<Co2DataAtTimeStep>,
    pub units: Units,
    pub zone: Option<Vec<String>>,
}

pub fn mole_to_mass_fraction(x: f64, m_co2: f64, m_h2o: f64) -> f64 {
    x * m_co2 / (m_h2o + (m_co2 - m_h2o) * x)
}

fn mass_fractions(x: &Array1<f64>, config: &Co2Config) -> Array1<f64> {
    x.mapv(|v| mole_to_mass_fraction(v, config.co2_molar_mass, config.water_molar_mass))
}

/// Partial molar volume (m3/mol) of CO2 in a phase with CO2 mole fraction
/// `x` and density `rho`. Zero where `x` is zero or the result is negative.
pub fn co2_molar_volume(x: f64, rho: f64, water_density: f64, config: &Co2Config) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    let m_w = config.water_molar_mass;
    let m_co2 = config.co2_molar_mass;
    let vm = (1.0 / x)
        * (-m_w * (1.0 - x) / (1000.0 * water_density)
            + (m_co2 * x + m_w * (1.0 - x)) / (1000.0 * rho));
    if vm < 0.0 {
        0.0
    } else {
        vm
    }
}

/// Partial molar volume (m3/mol) of CO2 from an Eclipse phase with CO2
/// mole fraction `x` and molar density `b` (kg-mol/m3).
pub fn co2_molar_volume_eclipse(x: f64, b: f64, water_density: f64, config: &Co2Config) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    let m_w = config.water_molar_mass;
    let vm = (1.0 / x) * (-m_w * (1.0 - x) / (1000.0 * water_density) + 1.0 / (1000.0 * b));
    if vm < 0.0 {
        0.0
    } else {
        vm
    }
}

/// Per date: (gas, aqueous) amount per cell.
type PhaseAmounts = Vec<(Array1<f64>, Array1<f64>)>;

/// Gas and aqueous CO2 mass (kg) per cell, per date.
fn co2_mass(
    source: &SourceData,
    layout: SimulatorLayout,
    config: &Co2Config,
) -> Co2Result<PhaseAmounts> {
    let sgas = source.series(Property::Sgas)?;
    let n_dates = source.dates().len();
    match layout {
        SimulatorLayout::Pflotran => {
            let pore_volumes = source.pore_volumes();
            let dgas = source.series(Property::Dgas)?;
            let ymfg = source.series(Property::Ymfg)?;
            let swat = source.series(Property::Swat)?;
            let dwat = source.series(Property::Dwat)?;
            let amfg = source.series(Property::Amfg)?;
            Ok((0..n_dates)
                .map(|t| {
                    let gas =
                        &sgas[t] * &dgas[t] * &mass_fractions(&ymfg[t], config) * &pore_volumes;
                    let aqu =
                        &swat[t] * &dwat[t] * &mass_fractions(&amfg[t], config) * &pore_volumes;
                    (gas, aqu)
                })
                .collect())
        }
        SimulatorLayout::Eclipse => {
            let rporv = source.series(Property::Rporv)?;
            let bgas = source.series(Property::Bgas)?;
            let bwat = source.series(Property::Bwat)?;
            let ymf2 = source.series(Property::Ymf2)?;
            let xmf2 = source.series(Property::Xmf2)?;
            let m_co2 = config.co2_molar_mass;
            Ok((0..n_dates)
                .map(|t| {
                    let gas = &bgas[t] * &ymf2[t] * &sgas[t] * &rporv[t] * m_co2;
                    let aqu =
                        &bwat[t] * &xmf2[t] * &sgas[t].mapv(|s| 1.0 - s) * &rporv[t] * m_co2;
                    (gas, aqu)
                })
                .collect())
        }
    }
}

/// Density of CO2-free water per cell, taken from the first report date.
/// Cells without CO2 use their own density, the rest the mean over CO2-free
/// cells, or `fallback` when there are none.
fn pure_water_density(
    density: &Array1<f64>,
    co2_fraction: &Array1<f64>,
    fallback: f64,
) -> Array1<f64> {
    let (sum, count) = Zip::from(density)
        .and(co2_fraction)
        .fold((0.0, 0usize), |(sum, count), &d, &x| {
            if x == 0.0 {
                (sum + d, count + 1)
            } else {
                (sum, count)
            }
        });
    let mean = if count > 0 { sum / count as f64 } else { fallback };
    Zip::from(density)
        .and(co2_fraction)
        .map_collect(|&d, &x| if x == 0.0 { d } else { mean })
}

fn co2_actual_volume(
    source: &SourceData,
    layout: SimulatorLayout,
    config: &Co2Config,
) -> Co2Result<PhaseAmounts> {
    let masses = co2_mass(source, layout, config)?;
    if masses.is_empty() {
        return Ok(masses);
    }
    let gas_x = source.series(layout.gas_mole_fraction())?;
    let aqu_x = source.series(layout.aqueous_mole_fraction())?;
    let (gas_rho, aqu_rho, water_density) = match layout {
        SimulatorLayout::Pflotran => {
            let dwat = source.series(Property::Dwat)?;
            let rho_w = pure_water_density(&dwat[0], &aqu_x[0], config.water_density);
            (source.series(Property::Dgas)?, dwat, rho_w)
        }
        SimulatorLayout::Eclipse => {
            let bwat = source.series(Property::Bwat)?;
            let mass_density = bwat[0].mapv(|b| b * config.water_molar_mass);
            let rho_w = pure_water_density(&mass_density, &aqu_x[0], config.water_density);
            (source.series(Property::Bgas)?, bwat, rho_w)
        }
    };
    let kg_per_mol = config.co2_molar_mass / 1000.0;
    let to_volume = |x: f64, rho: f64, rho_w: f64, mass: f64| {
        let vm = match layout {
            SimulatorLayout::Pflotran => co2_molar_volume(x, rho, rho_w, config),
            SimulatorLayout::Eclipse => co2_molar_volume_eclipse(x, rho, rho_w, config),
        };
        vm * mass / kg_per_mol
    };

    Ok(masses
        .into_iter()
        .enumerate()
        .map(|(t, (gas_mass, aqu_mass))| {
            let gas = Zip::from(&gas_x[t])
                .and(&gas_rho[t])
                .and(&water_density)
                .and(&gas_mass)
                .map_collect(|&x, &rho, &rho_w, &m| to_volume(x, rho, rho_w, m));
            let aqu = Zip::from(&aqu_x[t])
                .and(&aqu_rho[t])
                .and(&water_density)
                .and(&aqu_mass)
                .map_collect(|&x, &rho, &rho_w, &m| to_volume(x, rho, rho_w, m));
            (gas, aqu)
        })
        .collect())
}

/// Effective volume per date: `RPORV` for Eclipse, otherwise the static pore volume.
fn effective_volumes(
    source: &SourceData,
    layout: SimulatorLayout,
) -> Co2Result<Vec<Array1<f64>>> {
    match layout {
        SimulatorLayout::Pflotran => Ok(vec![source.pore_volumes(); source.dates().len()]),
        SimulatorLayout::Eclipse => Ok(source.series(Property::Rporv)?.to_vec()),
    }
}

fn co2_simple_volume(source: &SourceData, layout: SimulatorLayout) -> Co2Result<PhaseAmounts> {
    let volumes = effective_volumes(source, layout)?;
    let sgas = source.series(Property::Sgas)?;
    let gas_x = source.series(layout.gas_mole_fraction())?;
    let aqu_x = source.series(layout.aqueous_mole_fraction())?;

    Ok(volumes
        .iter()
        .enumerate()
        .map(|(t, v)| {
            (
                &sgas[t] * &gas_x[t] * v,
                &sgas[t].mapv(|s| 1.0 - s) * &aqu_x[t] * v,
            )
        })
        .collect())
}

/// Pore volume of the cells that carry CO2 at each date.
fn co2_cell_volume(
    source: &SourceData,
    layout: SimulatorLayout,
    config: &Co2Config,
) -> Co2Result<Vec<Array1<f64>>> {
    let pore_volumes = source.pore_volumes();
    let sgas = source.series(Property::Sgas)?;
    let aqu_x = source.series(layout.aqueous_mole_fraction())?;

    Ok((0..source.dates().len())
        .map(|t| {
            Zip::from(&sgas[t])
                .and(&aqu_x[t])
                .and(&pore_volumes)
                .map_collect(|&s, &a, &v| {
                    if s.abs() >= config.sgas_threshold || a.abs() >= config.amfg_threshold {
                        v
                    } else {
                        0.0
                    }
                })
        })
        .collect())
}

/// Compute the requested CO2 quantity for every cell and report date.
pub fn calculate_co2_data_from_source_data(
    source: &SourceData,
    calc_type: CalculationType,
    config: &Co2Config,
) -> Co2Result<Co2Data> {
    let layout = SimulatorLayout::detect(source, calc_type)?;
    info!(
        "Calculating CO2 {} from {layout} properties",
        calc_type.name().to_lowercase()
    );

    let zeros = || Array1::<f64>::zeros(source.n_cells());
    let data_list: Vec<Co2DataAtTimeStep> = if calc_type == CalculationType::CellVolume {
        co2_cell_volume(source, layout, config)?
            .into_iter()
            .zip(source.dates())
            .map(|(coverage, date)| Co2DataAtTimeStep {
                date: date.clone(),
                gas_phase: zeros(),
                aqu_phase: zeros(),
                volume_coverage: coverage,
            })
            .collect()
    } else {
        let per_phase = match calc_type {
            CalculationType::Mass => co2_mass(source, layout, config)?,
            CalculationType::ActualVolume => co2_actual_volume(source, layout, config)?,
            _ => co2_simple_volume(source, layout)?,
        };
        per_phase
            .into_iter()
            .zip(source.dates())
            .map(|((gas, aqu), date)| Co2DataAtTimeStep {
                date: date.clone(),
                gas_phase: gas,
                aqu_phase: aqu,
                volume_coverage: zeros(),
            })
            .collect()
    };

    Ok(Co2Data {
        x: source.x().clone(),
        y: source.y().clone(),
        data_list,
        units: calc_type.units(),
        zone: source.zone().map(<[String]>::to_vec),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PropertySeries;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn uniform_source(n_dates: usize) -> SourceData {
        let mut props = PropertySeries::new();
        let constant = |v: f64| vec![array![v, v]; n_dates];
        props.insert(Property::Swat, constant(0.7));
        props.insert(Property::Dwat, constant(1000.0));
        props.insert(Property::Sgas, vec![array![0.3, 0.0]; n_dates]);
        props.insert(Property::Dgas, constant(800.0));
        props.insert(Property::Amfg, vec![array![0.02, 0.0]; n_dates]);
        props.insert(Property::Ymfg, constant(0.99));
        SourceData::new(
            array![0.0, 1.0],
            array![0.0, 1.0],
            array![0.25, 0.25],
            array![8.0, 8.0],
            None,
            (0..n_dates).map(|i| format!("{}0101", 2030 + i)).collect(),
            props,
            Some(vec!["1".into(), "2".into()]),
        )
        .unwrap()
    }

    #[test]
    fn parse_calculation_type() {
        assert_eq!("mass".parse::<CalculationType>().unwrap(), CalculationType::Mass);
        assert_eq!(
            "Actual_Volume_Simplified".parse::<CalculationType>().unwrap(),
            CalculationType::ActualVolumeSimplified
        );
        match "bogus".parse::<CalculationType>() {
            Err(Co2Error::InvalidCalculationType(key)) => assert_eq!(key, "BOGUS"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn mass_fraction_identities() {
        for x in [0.0, 0.1, 0.5, 0.9, 1.0] {
            assert_relative_eq!(mole_to_mass_fraction(x, 30.0, 30.0), x, epsilon = 1e-15);
        }
        assert_eq!(mole_to_mass_fraction(0.0, 44.0, 18.0), 0.0);
        assert_relative_eq!(mole_to_mass_fraction(1.0, 44.0, 18.0), 1.0);
    }

    #[test]
    fn mass_fraction_increases_with_mole_fraction() {
        let values: Vec<f64> = (0..=100)
            .map(|i| mole_to_mass_fraction(i as f64 / 100.0, 44.0, 18.0))
            .collect();
        assert!(values.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn mass_uses_saturation_density_and_pore_volume() {
        let source = uniform_source(2);
        let config = Co2Config::default();
        let data = calculate_co2_data_from_source_data(&source, CalculationType::Mass, &config)
            .unwrap();
        assert_eq!(data.units, Units::Kg);
        assert_eq!(data.data_list.len(), 2);
        let step = &data.data_list[1];
        assert_eq!(step.date, "20310101");
        let pv = 2.0;
        assert_relative_eq!(
            step.gas_phase[0],
            pv * 0.3 * 800.0 * mole_to_mass_fraction(0.99, 44.0, 18.0)
        );
        assert_relative_eq!(
            step.aqu_phase[0],
            pv * 0.7 * 1000.0 * mole_to_mass_fraction(0.02, 44.0, 18.0)
        );
        assert_eq!(step.gas_phase[1], 0.0);
        assert_eq!(step.aqu_phase[1], 0.0);
        assert!(step.total_weight().iter().all(|&w| w >= 0.0));
        assert_eq!(data.zone.as_deref().unwrap(), &["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn cell_volume_counts_pore_volume_of_co2_cells() {
        let source = uniform_source(1);
        let data = calculate_co2_data_from_source_data(
            &source,
            CalculationType::CellVolume,
            &Co2Config::default(),
        )
        .unwrap();
        assert_eq!(data.units, Units::M3);
        let step = &data.data_list[0];
        // Pore volume 0.25 * 8, not the bulk volume.
        assert_eq!(step.volume_coverage, array![2.0, 0.0]);
        assert_eq!(step.total_weight(), array![0.0, 0.0]);
    }

    #[test]
    fn simplified_volume() {
        let source = uniform_source(1);
        let data = calculate_co2_data_from_source_data(
            &source,
            CalculationType::ActualVolumeSimplified,
            &Co2Config::default(),
        )
        .unwrap();
        let step = &data.data_list[0];
        assert_relative_eq!(step.gas_phase[0], 2.0 * 0.3 * 0.99);
        assert_relative_eq!(step.aqu_phase[0], 2.0 * (1.0 - 0.3) * 0.02);
    }

    #[test]
    fn simplified_volume_does_not_need_water_properties() {
        let source = SourceData::new(
            array![0.0],
            array![0.0],
            array![0.5],
            array![4.0],
            None,
            vec!["20300101".into()],
            PropertySeries::from([
                (Property::Sgas, vec![array![0.4]]),
                (Property::Amfg, vec![array![0.01]]),
                (Property::Ymfg, vec![array![1.0]]),
            ]),
            None,
        )
        .unwrap();
        let data = calculate_co2_data_from_source_data(
            &source,
            CalculationType::ActualVolumeSimplified,
            &Co2Config::default(),
        )
        .unwrap();
        assert_relative_eq!(data.data_list[0].gas_phase[0], 2.0 * 0.4);
        assert_relative_eq!(data.data_list[0].aqu_phase[0], 2.0 * 0.6 * 0.01);
    }

    #[test]
    fn actual_volume_converts_mass_with_molar_volume() {
        let source = uniform_source(1);
        let config = Co2Config::default();
        let mass = calculate_co2_data_from_source_data(&source, CalculationType::Mass, &config)
            .unwrap();
        let volume =
            calculate_co2_data_from_source_data(&source, CalculationType::ActualVolume, &config)
                .unwrap();
        // Cell 1 is CO2 free, so its DWAT (1000) is the pure-water density everywhere.
        let vm_gas = co2_molar_volume(0.99, 800.0, 1000.0, &config);
        let expected = vm_gas * mass.data_list[0].gas_phase[0] / 0.044;
        assert_relative_eq!(volume.data_list[0].gas_phase[0], expected, max_relative = 1e-12);
        assert!(volume.data_list[0].aqu_phase[0] >= 0.0);
        assert_eq!(volume.data_list[0].gas_phase[1], 0.0);
    }

    #[test]
    fn aqueous_actual_volume_uses_mean_pure_water_density() {
        // Cells 1 and 2 are CO2 free at the first date, so cell 0 sees the
        // mean of their densities rather than its own.
        let constant = |v: f64| vec![array![v, v, v]];
        let source = SourceData::new(
            array![0.0, 1.0, 2.0],
            array![0.0, 0.0, 0.0],
            array![0.25, 0.25, 0.25],
            array![8.0, 8.0, 8.0],
            None,
            vec!["20300101".into()],
            PropertySeries::from([
                (Property::Swat, constant(0.8)),
                (Property::Dwat, vec![array![1030.0, 1010.0, 990.0]]),
                (Property::Sgas, constant(0.2)),
                (Property::Dgas, constant(700.0)),
                (Property::Amfg, vec![array![0.02, 0.0, 0.0]]),
                (Property::Ymfg, constant(1.0)),
            ]),
            None,
        )
        .unwrap();
        let config = Co2Config::default();
        let mass = calculate_co2_data_from_source_data(&source, CalculationType::Mass, &config)
            .unwrap();
        let volume =
            calculate_co2_data_from_source_data(&source, CalculationType::ActualVolume, &config)
                .unwrap();
        let vm_aqu = co2_molar_volume(0.02, 1030.0, 1000.0, &config);
        let expected = vm_aqu * mass.data_list[0].aqu_phase[0] / 0.044;
        assert!(expected > 0.0);
        assert_relative_eq!(volume.data_list[0].aqu_phase[0], expected, max_relative = 1e-12);
        assert_eq!(volume.data_list[0].aqu_phase[1], 0.0);
        assert_eq!(volume.data_list[0].aqu_phase[2], 0.0);
    }

    fn eclipse_source() -> SourceData {
        SourceData::new(
            array![0.0, 1.0],
            array![0.0, 1.0],
            array![0.25, 0.25],
            array![8.0, 8.0],
            None,
            vec!["20300101".into()],
            PropertySeries::from([
                (Property::Sgas, vec![array![0.3, 0.0]]),
                (Property::Rporv, vec![array![1.5, 1.5]]),
                (Property::Bwat, vec![array![54.0, 55.0]]),
                (Property::Bgas, vec![array![18.0, 18.0]]),
                (Property::Xmf2, vec![array![0.02, 0.0]]),
                (Property::Ymf2, vec![array![0.98, 0.0]]),
            ]),
            None,
        )
        .unwrap()
    }

    #[test]
    fn eclipse_layout_is_detected_from_present_properties() {
        let source = eclipse_source();
        assert_eq!(
            SimulatorLayout::detect(&source, CalculationType::Mass).unwrap(),
            SimulatorLayout::Eclipse
        );
        assert_eq!(
            SimulatorLayout::detect(&uniform_source(1), CalculationType::Mass).unwrap(),
            SimulatorLayout::Pflotran
        );
    }

    #[test]
    fn eclipse_mass_and_simplified_volume_use_rporv() {
        let source = eclipse_source();
        let config = Co2Config::default();
        let mass = calculate_co2_data_from_source_data(&source, CalculationType::Mass, &config)
            .unwrap();
        let step = &mass.data_list[0];
        assert_relative_eq!(step.gas_phase[0], 44.0 * 18.0 * 0.98 * 0.3 * 1.5);
        assert_relative_eq!(step.aqu_phase[0], 44.0 * 54.0 * 0.02 * 0.7 * 1.5);
        assert_eq!(step.total_weight()[1], 0.0);

        let simple = calculate_co2_data_from_source_data(
            &source,
            CalculationType::ActualVolumeSimplified,
            &config,
        )
        .unwrap();
        assert_relative_eq!(simple.data_list[0].gas_phase[0], 1.5 * 0.3 * 0.98);
        assert_relative_eq!(simple.data_list[0].aqu_phase[0], 1.5 * 0.7 * 0.02);
    }

    #[test]
    fn eclipse_actual_volume_uses_molar_densities() {
        let source = eclipse_source();
        let config = Co2Config::default();
        let mass = calculate_co2_data_from_source_data(&source, CalculationType::Mass, &config)
            .unwrap();
        let volume =
            calculate_co2_data_from_source_data(&source, CalculationType::ActualVolume, &config)
                .unwrap();
        // Cell 1 is CO2 free: pure water density is 18 * 55.
        let rho_w = 18.0 * 55.0;
        let vm_gas = co2_molar_volume_eclipse(0.98, 18.0, rho_w, &config);
        let vm_aqu = co2_molar_volume_eclipse(0.02, 54.0, rho_w, &config);
        assert!(vm_aqu > 0.0);
        assert_relative_eq!(
            volume.data_list[0].gas_phase[0],
            vm_gas * mass.data_list[0].gas_phase[0] / 0.044,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            volume.data_list[0].aqu_phase[0],
            vm_aqu * mass.data_list[0].aqu_phase[0] / 0.044,
            max_relative = 1e-12
        );
    }

    #[test]
    fn eclipse_cell_volume_thresholds_xmf2() {
        let data = calculate_co2_data_from_source_data(
            &eclipse_source(),
            CalculationType::CellVolume,
            &Co2Config::default(),
        )
        .unwrap();
        assert_eq!(data.data_list[0].volume_coverage, array![2.0, 0.0]);
    }

    #[test]
    fn incomplete_eclipse_set_reports_eclipse_properties() {
        let source = SourceData::new(
            array![0.0],
            array![0.0],
            array![0.2],
            array![1.0],
            None,
            vec!["20300101".into()],
            PropertySeries::from([
                (Property::Sgas, vec![array![0.1]]),
                (Property::Xmf2, vec![array![0.01]]),
                (Property::Bwat, vec![array![55.0]]),
            ]),
            None,
        )
        .unwrap();
        match calculate_co2_data_from_source_data(
            &source,
            CalculationType::Mass,
            &Co2Config::default(),
        ) {
            Err(Co2Error::MissingProperties(missing)) => {
                assert_eq!(missing, vec!["RPORV", "BGAS", "YMF2"])
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn molar_volume_is_clipped_at_zero() {
        let config = Co2Config::default();
        assert_eq!(co2_molar_volume(0.0, 1000.0, 1000.0, &config), 0.0);
        // Denser than pure water at tiny CO2 fraction gives a negative raw value.
        assert_eq!(co2_molar_volume(1e-6, 2000.0, 1000.0, &config), 0.0);
    }

    #[test]
    fn pure_water_density_falls_back_to_configured_value() {
        let rho = pure_water_density(&array![1010.0, 1020.0], &array![0.1, 0.2], 999.0);
        assert_eq!(rho, array![999.0, 999.0]);
        let rho = pure_water_density(&array![1010.0, 1020.0, 990.0], &array![0.0, 0.2, 0.0], 999.0);
        assert_eq!(rho, array![1010.0, 1000.0, 990.0]);
    }

    #[test]
    fn missing_properties_fail_before_calculation() {
        let source = SourceData::new(
            array![0.0],
            array![0.0],
            array![0.2],
            array![1.0],
            None,
            vec!["20300101".into()],
            PropertySeries::from([
                (Property::Sgas, vec![array![0.1]]),
                (Property::Amfg, vec![array![0.1]]),
            ]),
            None,
        )
        .unwrap();
        let config = Co2Config::default();
        assert!(calculate_co2_data_from_source_data(&source, CalculationType::CellVolume, &config)
            .is_ok());
        match calculate_co2_data_from_source_data(&source, CalculationType::Mass, &config) {
            Err(Co2Error::MissingProperties(missing)) => {
                assert_eq!(missing, vec!["SWAT", "DWAT", "DGAS", "YMFG"])
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
