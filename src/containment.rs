//! Splits per-cell CO2 amounts into contained, outside and hazardous totals.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use log::{debug, info};
use ndarray::{Array1, Zip};

use crate::calculation::{CalculationType, Co2Data};
use crate::config::ClassifierKind;
use crate::error::{Co2Error, Co2Result};
use crate::polygon::Polygon;
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Gas,
    Aqueous,
    Undefined,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Gas => schema::phase::GAS,
            Phase::Aqueous => schema::phase::AQUEOUS,
            Phase::Undefined => schema::phase::UNDEFINED,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Contained,
    Outside,
    Hazardous,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Contained, Location::Outside, Location::Hazardous];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Contained => schema::location::CONTAINED,
            Location::Outside => schema::location::OUTSIDE,
            Location::Hazardous => schema::location::HAZARDOUS,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summed CO2 amount for one date, phase and location, optionally per zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainedCo2 {
    /// `YYYY-MM-DD`
    pub date: String,
    pub amount: f64,
    pub phase: Phase,
    pub location: Location,
    pub zone: Option<String>,
}

/// Normalize a report date to `YYYY-MM-DD`. Accepts `YYYYMMDD` and `YYYY-MM-DD`.
pub fn normalize_date(date: &str) -> Co2Result<String> {
    let trimmed = date.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d"))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| Co2Error::InvalidData(format!("Unrecognized report date: '{date}'")))
}

/// Numeric labels first in numeric order, then the rest lexicographically.
pub fn compare_zones(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Cell masks for the three locations. Hazardous wins over contained.
struct LocationMasks {
    contained: Array1<bool>,
    outside: Array1<bool>,
    hazardous: Array1<bool>,
}

impl LocationMasks {
    fn new(is_contained: Array1<bool>, is_hazardous: Array1<bool>) -> Self {
        let contained = Zip::from(&is_contained)
            .and(&is_hazardous)
            .map_collect(|&c, &h| c && !h);
        let outside = Zip::from(&is_contained)
            .and(&is_hazardous)
            .map_collect(|&c, &h| !c && !h);
        Self {
            contained,
            outside,
            hazardous: is_hazardous,
        }
    }

    fn get(&self, location: Location) -> &Array1<bool> {
        match location {
            Location::Contained => &self.contained,
            Location::Outside => &self.outside,
            Location::Hazardous => &self.hazardous,
        }
    }
}

fn masked_sum(values: &Array1<f64>, mask: &Array1<bool>, zone: Option<&Array1<bool>>) -> f64 {
    match zone {
        Some(zone) => Zip::from(values)
            .and(mask)
            .and(zone)
            .fold(0.0, |acc, &v, &m, &z| if m && z { acc + v } else { acc }),
        None => Zip::from(values)
            .and(mask)
            .fold(0.0, |acc, &v, &m| if m { acc + v } else { acc }),
    }
}

/// Sum the CO2 in `co2_data` per date, zone, phase and location.
///
/// Without a containment polygon every cell counts as contained. Without a
/// hazardous polygon no cell is hazardous. Records are ordered by date, then
/// zone, phase and location.
pub fn calculate_co2_containment(
    co2_data: &Co2Data,
    containment_polygon: Option<&Polygon>,
    hazardous_polygon: Option<&Polygon>,
    calc_type: CalculationType,
    classifier: ClassifierKind,
) -> Co2Result<Vec<ContainedCo2>> {
    info!("Calculate contained CO2 using input polygons");
    let n = co2_data.x.len();
    let is_contained = match containment_polygon {
        Some(polygon) => polygon
            .classifier(classifier)
            .classify(&co2_data.x, &co2_data.y),
        None => Array1::from_elem(n, true),
    };
    let is_hazardous = match hazardous_polygon {
        Some(polygon) => polygon
            .classifier(classifier)
            .classify(&co2_data.x, &co2_data.y),
        None => Array1::from_elem(n, false),
    };
    let masks = LocationMasks::new(is_contained, is_hazardous);
    debug!(
        "{} contained, {} outside, {} hazardous cells",
        masks.contained.iter().filter(|&&b| b).count(),
        masks.outside.iter().filter(|&&b| b).count(),
        masks.hazardous.iter().filter(|&&b| b).count()
    );

    let zones: Vec<(Option<String>, Option<Array1<bool>>)> = match &co2_data.zone {
        Some(labels) => {
            let mut distinct: Vec<&String> = labels
                .iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            distinct.sort_by(|a, b| compare_zones(a, b));
            distinct
                .into_iter()
                .map(|z| {
                    let mask = labels.iter().map(|l| l == z).collect();
                    (Some(z.clone()), Some(mask))
                })
                .collect()
        }
        None => vec![(None, None)],
    };

    let mut records = Vec::with_capacity(co2_data.data_list.len() * zones.len() * 6);
    for step in &co2_data.data_list {
        let date = normalize_date(&step.date)?;
        let phases: Vec<(Phase, &Array1<f64>)> = if calc_type == CalculationType::CellVolume {
            vec![(Phase::Undefined, &step.volume_coverage)]
        } else {
            vec![(Phase::Gas, &step.gas_phase), (Phase::Aqueous, &step.aqu_phase)]
        };
        for (zone, zone_mask) in &zones {
            for (phase, values) in &phases {
                for location in Location::ALL {
                    records.push(ContainedCo2 {
                        date: date.clone(),
                        amount: masked_sum(values, masks.get(location), zone_mask.as_ref()),
                        phase: *phase,
                        location,
                        zone: zone.clone(),
                    });
                }
            }
        }
    }
    Ok(records)
}
