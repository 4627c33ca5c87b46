use log::{debug, info, warn};
use ndarray::Array1;

use crate::config::Co2Config;
use crate::error::{Co2Error, Co2Result};
use crate::source::{Property, PropertySeries, SourceData};

/// Active-cell arrays as delivered by a reader, before gas-less cells are dropped.
#[derive(Debug, Clone, Default)]
pub struct RawCellData {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub volumes: Array1<f64>,
    pub poro: Array1<f64>,
    pub porv: Option<Array1<f64>>,
    pub dates: Vec<String>,
    pub properties: PropertySeries,
    pub zone: Option<Vec<String>>,
}

/// Cells where both SGAS and the aqueous mole fraction stay below their thresholds at every date.
pub fn identify_gas_less_cells(
    sgas: &[Array1<f64>],
    amfg: &[Array1<f64>],
    n_cells: usize,
    config: &Co2Config,
) -> Array1<bool> {
    let mut gas_less = Array1::from_elem(n_cells, true);
    for values in sgas {
        gas_less.zip_mut_with(values, |g, &s| *g &= s.abs() < config.sgas_threshold);
    }
    for values in amfg {
        gas_less.zip_mut_with(values, |g, &a| *g &= a.abs() < config.amfg_threshold);
    }
    gas_less
}

fn select(values: &Array1<f64>, keep: &[usize]) -> Array1<f64> {
    keep.iter().map(|&i| values[i]).collect()
}

/// Keep only the cells at indices `keep`, in that order, in every per-cell array.
pub fn filter_cells(raw: RawCellData, keep: &[usize]) -> RawCellData {
    let properties = raw
        .properties
        .into_iter()
        .map(|(p, arrays)| (p, arrays.iter().map(|a| select(a, keep)).collect()))
        .collect();
    RawCellData {
        x: select(&raw.x, keep),
        y: select(&raw.y, keep),
        volumes: select(&raw.volumes, keep),
        poro: select(&raw.poro, keep),
        porv: raw.porv.as_ref().map(|p| select(p, keep)),
        dates: raw.dates,
        properties,
        zone: raw
            .zone
            .map(|zone| keep.iter().map(|&i| zone[i].clone()).collect()),
    }
}

/// Every per-cell array must cover the `n_active` cells before any is indexed.
fn check_cell_counts(raw: &RawCellData, n_active: usize) -> Co2Result<()> {
    let mismatch = |what: &str, len: usize| {
        Co2Error::Validation(format!(
            "{what} has {len} cells, grid has {n_active} active cells"
        ))
    };
    let static_arrays = [
        ("Y", Some(&raw.y)),
        ("VOLUME", Some(&raw.volumes)),
        ("PORO", Some(&raw.poro)),
        ("PORV", raw.porv.as_ref()),
    ];
    for (name, values) in static_arrays {
        if let Some(values) = values.filter(|v| v.len() != n_active) {
            return Err(mismatch(name, values.len()));
        }
    }
    if let Some(zone) = raw.zone.as_ref().filter(|z| z.len() != n_active) {
        return Err(mismatch("zone", zone.len()));
    }
    for (property, arrays) in &raw.properties {
        if let Some((t, values)) = arrays
            .iter()
            .enumerate()
            .find(|(_, a)| a.len() != n_active)
        {
            let date = raw.dates.get(t).map(String::as_str).unwrap_or("?");
            return Err(mismatch(&format!("{property} at {date}"), values.len()));
        }
    }
    Ok(())
}

/// Build [`SourceData`] from active-cell arrays, dropping cells that never carry CO2.
///
/// Gas-less cells are found from `SGAS` with `AMFG`, or with `XMF2` for
/// Eclipse exports that carry no `AMFG`.
pub fn extract_source_data(raw: RawCellData, config: &Co2Config) -> Co2Result<SourceData> {
    info!("Start extracting source data");
    let n_active = raw.x.len();
    info!("Number of active grid cells: {n_active}");
    check_cell_counts(&raw, n_active)?;

    let aqueous = raw
        .properties
        .get(&Property::Amfg)
        .or_else(|| raw.properties.get(&Property::Xmf2));
    let (sgas, amfg) = match (raw.properties.get(&Property::Sgas), aqueous) {
        (Some(sgas), Some(amfg)) => (sgas, amfg),
        (sgas, amfg) => {
            let mut missing = Vec::new();
            if sgas.is_none() {
                missing.push(Property::Sgas.keyword().to_string());
            }
            if amfg.is_none() {
                missing.push(Property::Amfg.keyword().to_string());
            }
            return Err(Co2Error::MissingProperties(missing));
        }
    };

    let gas_less = identify_gas_less_cells(sgas, amfg, n_active, config);
    let keep: Vec<usize> = gas_less
        .iter()
        .enumerate()
        .filter(|&(_, &g)| !g)
        .map(|(i, _)| i)
        .collect();
    debug!("{} of {n_active} active cells carry CO2", keep.len());
    if keep.is_empty() {
        warn!("No grid cells with CO2 found");
    }

    let reduced = filter_cells(raw, &keep);
    SourceData::new(
        reduced.x,
        reduced.y,
        reduced.poro,
        reduced.volumes,
        reduced.porv,
        reduced.dates,
        reduced.properties,
        reduced.zone,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn raw_three_cells() -> RawCellData {
        let mut properties = PropertySeries::new();
        properties.insert(
            Property::Sgas,
            vec![array![0.0, 0.3, 0.0], array![0.0, 0.4, 0.0]],
        );
        properties.insert(
            Property::Amfg,
            vec![array![0.0, 0.0, 0.0], array![0.0, 0.01, 1e-3]],
        );
        properties.insert(
            Property::Swat,
            vec![array![1.0, 0.7, 1.0], array![1.0, 0.6, 1.0]],
        );
        RawCellData {
            x: array![1.0, 2.0, 3.0],
            y: array![4.0, 5.0, 6.0],
            volumes: array![10.0, 20.0, 30.0],
            poro: array![0.1, 0.2, 0.3],
            porv: None,
            dates: vec!["20300101".into(), "20310101".into()],
            properties,
            zone: Some(vec!["A".into(), "B".into(), "C".into()]),
        }
    }

    #[test]
    fn gas_less_requires_both_properties_below_threshold_at_all_dates() {
        let raw = raw_three_cells();
        let mask = identify_gas_less_cells(
            &raw.properties[&Property::Sgas],
            &raw.properties[&Property::Amfg],
            3,
            &Co2Config::default(),
        );
        assert_eq!(mask, array![true, false, false]);
    }

    #[test]
    fn tiny_but_nonzero_values_are_kept() {
        let sgas = vec![array![1e-12]];
        let amfg = vec![array![0.0]];
        let mask = identify_gas_less_cells(&sgas, &amfg, 1, &Co2Config::default());
        assert_eq!(mask, array![false]);
    }

    #[test]
    fn extraction_filters_every_array_consistently() {
        let sd = extract_source_data(raw_three_cells(), &Co2Config::default()).unwrap();
        assert_eq!(sd.n_cells(), 2);
        assert_eq!(sd.x(), &array![2.0, 3.0]);
        assert_eq!(sd.y(), &array![5.0, 6.0]);
        assert_eq!(sd.volumes(), &array![20.0, 30.0]);
        assert_eq!(sd.poro(), &array![0.2, 0.3]);
        assert_eq!(sd.zone().unwrap(), &["B".to_string(), "C".to_string()]);
        let swat = sd.series(Property::Swat).unwrap();
        assert_eq!(swat[1], array![0.6, 1.0]);
        assert_eq!(sd.dates(), &["20300101".to_string(), "20310101".to_string()]);
    }

    #[test]
    fn missing_sgas_and_amfg_reported_together() {
        let mut raw = raw_three_cells();
        raw.properties.remove(&Property::Sgas);
        raw.properties.remove(&Property::Amfg);
        match extract_source_data(raw, &Co2Config::default()) {
            Err(Co2Error::MissingProperties(missing)) => {
                assert_eq!(missing, vec!["SGAS".to_string(), "AMFG".to_string()])
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn short_static_array_is_rejected_before_filtering() {
        let mut raw = raw_three_cells();
        raw.poro = array![0.1];
        match extract_source_data(raw, &Co2Config::default()) {
            Err(Co2Error::Validation(msg)) => assert!(msg.starts_with("PORO has 1 cells")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn long_static_array_is_rejected() {
        let mut raw = raw_three_cells();
        raw.poro = array![0.1, 0.2, 0.3, 0.4];
        assert!(matches!(
            extract_source_data(raw, &Co2Config::default()),
            Err(Co2Error::Validation(_))
        ));
    }

    #[test]
    fn short_property_array_names_property_and_date() {
        let mut raw = raw_three_cells();
        raw.properties
            .insert(Property::Swat, vec![array![1.0, 0.7, 1.0], array![1.0]]);
        match extract_source_data(raw, &Co2Config::default()) {
            Err(Co2Error::Validation(msg)) => assert!(msg.starts_with("SWAT at 20310101")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn short_zone_is_rejected() {
        let mut raw = raw_three_cells();
        raw.zone = Some(vec!["A".into()]);
        assert!(matches!(
            extract_source_data(raw, &Co2Config::default()),
            Err(Co2Error::Validation(_))
        ));
    }

    #[test]
    fn eclipse_exports_use_xmf2_for_gas_less_cells() {
        let mut raw = raw_three_cells();
        let amfg = raw.properties.remove(&Property::Amfg).unwrap();
        raw.properties.insert(Property::Xmf2, amfg);
        let sd = extract_source_data(raw, &Co2Config::default()).unwrap();
        assert_eq!(sd.x(), &array![2.0, 3.0]);
        assert!(sd.has_property(Property::Xmf2));
    }

    #[test]
    fn no_dates_gives_empty_source_data() {
        let mut raw = raw_three_cells();
        raw.dates.clear();
        for arrays in raw.properties.values_mut() {
            arrays.clear();
        }
        let sd = extract_source_data(raw, &Co2Config::default()).unwrap();
        assert_eq!(sd.n_cells(), 0);
        assert!(sd.dates().is_empty());
    }
}
