//! Containment records as polars tables, and CSV export.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{info, warn};
use polars::prelude::*;

use crate::calculation::{CalculationType, Co2Data};
use crate::config::Co2Config;
use crate::containment::{calculate_co2_containment, ContainedCo2, Location, Phase};
use crate::error::Co2Result;
use crate::polygon::Polygon;
use crate::schema::containment::{AMOUNT, DATE, LOCATION, PHASE, TOTAL, ZONE};

/// Result of one containment run, in the layout the caller asked for.
#[derive(Debug, Clone)]
pub enum ContainmentOutput {
    /// One row per date, phase, location and zone.
    Compact(DataFrame),
    /// One row per date with derived total columns.
    Merged(DataFrame),
    /// One merged table per zone label.
    Zoned(BTreeMap<String, DataFrame>),
}

/// Flat table with columns `date, amount, phase, location, zone`.
pub fn construct_containment_table(records: &[ContainedCo2]) -> Co2Result<DataFrame> {
    let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
    let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
    let phases: Vec<&str> = records.iter().map(|r| r.phase.as_str()).collect();
    let locations: Vec<&str> = records.iter().map(|r| r.location.as_str()).collect();
    let zones: Vec<Option<&str>> = records.iter().map(|r| r.zone.as_deref()).collect();

    Ok(DataFrame::new(vec![
        Column::new(DATE.into(), dates),
        Column::new(AMOUNT.into(), amounts),
        Column::new(PHASE.into(), phases),
        Column::new(LOCATION.into(), locations),
        Column::new(ZONE.into(), zones),
    ])?)
}

/// Names and filters of the merged columns after `date`, in output order.
fn merged_columns(calc_type: CalculationType) -> Vec<(String, Expr)> {
    let amount = || col(AMOUNT);
    let is_phase = |p: Phase| col(PHASE).eq(lit(p.as_str()));
    let is_location = |l: Location| col(LOCATION).eq(lit(l.as_str()));

    let mut columns = vec![(TOTAL.to_string(), amount().sum())];
    let phases = [Phase::Gas, Phase::Aqueous];
    if calc_type != CalculationType::CellVolume {
        for phase in phases {
            columns.push((
                format!("{TOTAL}_{phase}"),
                amount().filter(is_phase(phase)).sum(),
            ));
        }
    }
    for location in Location::ALL {
        columns.push((
            format!("{TOTAL}_{location}"),
            amount().filter(is_location(location)).sum(),
        ));
    }
    if calc_type != CalculationType::CellVolume {
        for location in Location::ALL {
            for phase in phases {
                columns.push((
                    format!("{phase}_{location}"),
                    amount()
                        .filter(is_phase(phase).and(is_location(location)))
                        .sum(),
                ));
            }
        }
    }
    columns
}

/// Pivot a containment table into one row per date (first-appearance order).
///
/// Columns: `date, total, total_gas, total_aqueous, total_contained,
/// total_outside, total_hazardous` followed by `<phase>_<location>`.
/// `CELL_VOLUME` tables only carry `total` and `total_<location>`.
pub fn merge_date_rows(table: &DataFrame, calc_type: CalculationType) -> Co2Result<DataFrame> {
    let columns = merged_columns(calc_type);
    if table.height() == 0 {
        let mut empty = vec![Column::new(DATE.into(), Vec::<String>::new())];
        empty.extend(
            columns
                .iter()
                .map(|(name, _)| Column::new(name.as_str().into(), Vec::<f64>::new())),
        );
        return Ok(DataFrame::new(empty)?);
    }

    let aggregations: Vec<Expr> = columns
        .into_iter()
        .map(|(name, expr)| expr.alias(name))
        .collect();
    Ok(table
        .clone()
        .lazy()
        .group_by_stable([col(DATE)])
        .agg(aggregations)
        .collect()?)
}

/// Aggregate `co2_data` against the polygons and assemble the requested layout.
pub fn calculate_from_co2_data(
    co2_data: &Co2Data,
    containment_polygon: Option<&Polygon>,
    hazardous_polygon: Option<&Polygon>,
    compact: bool,
    calc_type_input: &str,
    config: &Co2Config,
) -> Co2Result<ContainmentOutput> {
    let calc_type: CalculationType = calc_type_input.parse()?;
    let records = calculate_co2_containment(
        co2_data,
        containment_polygon,
        hazardous_polygon,
        calc_type,
        config.point_classifier,
    )?;
    if records.is_empty() {
        warn!("No CO2 found, the result table is empty");
    }
    let table = construct_containment_table(&records)?;
    if compact {
        return Ok(ContainmentOutput::Compact(table));
    }
    if co2_data.zone.is_none() {
        return Ok(ContainmentOutput::Merged(merge_date_rows(&table, calc_type)?));
    }

    let mut zoned = BTreeMap::new();
    if table.height() > 0 {
        for part in table.partition_by_stable([ZONE], true)? {
            let zone = part
                .column(ZONE)?
                .str()?
                .get(0)
                .unwrap_or_default()
                .to_string();
            zoned.insert(zone, merge_date_rows(&part, calc_type)?);
        }
    }
    Ok(ContainmentOutput::Zoned(zoned))
}

/// `<stem>_<zone><suffix>` next to `outfile`. Path separators in the zone
/// label become `_`, so the file always lands in `outfile`'s directory.
pub fn zone_file_name(outfile: &Path, zone: &str) -> PathBuf {
    let zone = zone.replace(['/', '\\'], "_");
    let stem = outfile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = outfile
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    outfile.with_file_name(format!("{stem}_{zone}{suffix}"))
}

fn write_csv(df: &DataFrame, path: &Path) -> Co2Result<()> {
    let mut file = File::create(path)?;
    let mut df = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Write the output as CSV. Zoned output gives one file per zone. An empty
/// zoned result writes a header-only merged table to `outfile`.
pub fn write_output(
    output: &ContainmentOutput,
    outfile: &Path,
    calc_type: CalculationType,
) -> Co2Result<Vec<PathBuf>> {
    match output {
        ContainmentOutput::Compact(df) | ContainmentOutput::Merged(df) => {
            if df.height() == 0 {
                warn!("No data, writing header only to {}", outfile.display());
            }
            write_csv(df, outfile)?;
            Ok(vec![outfile.to_path_buf()])
        }
        ContainmentOutput::Zoned(zones) if zones.is_empty() => {
            warn!("No data, writing header only to {}", outfile.display());
            let empty = merge_date_rows(&construct_containment_table(&[])?, calc_type)?;
            write_csv(&empty, outfile)?;
            Ok(vec![outfile.to_path_buf()])
        }
        ContainmentOutput::Zoned(zones) => zones
            .iter()
            .map(|(zone, df)| {
                let path = zone_file_name(outfile, zone);
                write_csv(df, &path)?;
                Ok(path)
            })
            .collect(),
    }
}
