use std::path::{Path, PathBuf};

use log::info;
use ndarray::Array1;
use polars::prelude::*;

use crate::error::{Co2Error, Co2Result};
use crate::extraction::RawCellData;
use crate::schema::{grid, init, restart};
use crate::source::{Property, PropertySeries};

/// Paths to the exported simulation data and optional polygons for one run.
#[derive(Debug, Clone, Default)]
pub struct InputFiles {
    pub grid: PathBuf,
    pub unrst: PathBuf,
    pub init: PathBuf,
    pub zone: Option<PathBuf>,
    pub containment_polygon: Option<PathBuf>,
    pub hazardous_polygon: Option<PathBuf>,
}

impl InputFiles {
    /// Restart and init paths default to the grid path with `EGRID` replaced
    /// by `UNRST` and `INIT` in the file name.
    pub fn from_grid(grid: PathBuf, unrst: Option<PathBuf>, init: Option<PathBuf>) -> Self {
        let unrst = unrst.unwrap_or_else(|| sibling_path(&grid, "UNRST"));
        let init = init.unwrap_or_else(|| sibling_path(&grid, "INIT"));
        Self {
            grid,
            unrst,
            init,
            ..Default::default()
        }
    }

    /// Fail with every missing file listed, before any computation starts.
    pub fn check_exist(&self) -> Co2Result<()> {
        let missing: Vec<String> = [Some(&self.grid), Some(&self.unrst), Some(&self.init)]
            .into_iter()
            .chain([
                self.zone.as_ref(),
                self.containment_polygon.as_ref(),
                self.hazardous_polygon.as_ref(),
            ])
            .flatten()
            .filter(|p| !p.is_file())
            .map(|p| p.display().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Co2Error::FilesNotFound(missing))
        }
    }
}

fn sibling_path(grid: &Path, keyword: &str) -> PathBuf {
    match grid.file_name().and_then(|n| n.to_str()) {
        Some(name) => grid.with_file_name(name.replace("EGRID", keyword)),
        None => grid.to_path_buf(),
    }
}

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub fn read_csv_as_strings(path: &Path) -> Co2Result<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}

/// Case-insensitive column lookup returning the stored column name.
pub fn find_column(df: &DataFrame, name: &str) -> Option<String> {
    df.get_column_names_str()
        .iter()
        .find(|c| c.eq_ignore_ascii_case(name))
        .map(|c| c.to_string())
}

fn require_column(df: &DataFrame, name: &str, path: &Path) -> Co2Result<String> {
    find_column(df, name)
        .ok_or_else(|| Co2Error::MissingColumn(format!("{name} in {}", path.display())))
}

/// Parse a string column to f64. Empty or non-numeric values are an error.
pub fn parse_float_column(df: &DataFrame, column: &str, path: &Path) -> Co2Result<Array1<f64>> {
    let parsed = df
        .clone()
        .lazy()
        .select([col(column)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .cast(DataType::Float64)])
        .collect()?;
    let values = parsed.column(column)?.f64()?;
    if values.null_count() > 0 {
        return Err(Co2Error::InvalidData(format!(
            "Column '{column}' in {} has {} non-numeric values",
            path.display(),
            values.null_count()
        )));
    }
    Ok(values.into_no_null_iter().collect())
}

/// Active-cell mask from the optional ACTNUM column.
fn active_mask(df: &DataFrame, path: &Path) -> Co2Result<Vec<bool>> {
    match find_column(df, grid::ACTNUM) {
        Some(name) => Ok(parse_float_column(df, &name, path)?
            .iter()
            .map(|&a| a > 0.0)
            .collect()),
        None => Ok(vec![true; df.height()]),
    }
}

fn select_active<T>(values: impl IntoIterator<Item = T>, active: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(active)
        .filter(|(_, a)| **a)
        .map(|(v, _)| v)
        .collect()
}

/// Long-layout restart export: one row per active cell per date.
fn read_restart(path: &Path, n_active: usize) -> Co2Result<(Vec<String>, PropertySeries)> {
    let df = read_csv_as_strings(path)?;
    let date_col = require_column(&df, restart::DATE, path)?;
    let present: Vec<(Property, String)> = Property::ALL
        .into_iter()
        .filter_map(|p| find_column(&df, p.keyword()).map(|name| (p, name)))
        .collect();

    let mut dates = Vec::new();
    let mut properties: PropertySeries = present.iter().map(|(p, _)| (*p, Vec::new())).collect();
    if df.height() == 0 {
        return Ok((dates, properties));
    }
    for part in df.partition_by_stable([date_col.as_str()], true)? {
        let date = part
            .column(&date_col)?
            .str()?
            .get(0)
            .unwrap_or_default()
            .trim()
            .to_string();
        if part.height() != n_active {
            return Err(Co2Error::Validation(format!(
                "{} has {} cells at {date}, grid has {n_active} active cells",
                path.display(),
                part.height()
            )));
        }
        for (property, name) in &present {
            let values = parse_float_column(&part, name, path)?;
            properties.entry(*property).or_default().push(values);
        }
        dates.push(date);
    }
    Ok((dates, properties))
}

/// Read the CSV exports named in `files` into active-cell arrays.
pub fn read_raw_cell_data(files: &InputFiles) -> Co2Result<RawCellData> {
    info!("Reading grid from {}", files.grid.display());
    let grid_df = read_csv_as_strings(&files.grid)?;
    let active = active_mask(&grid_df, &files.grid)?;
    let grid_column = |name: &str| -> Co2Result<Array1<f64>> {
        let stored = require_column(&grid_df, name, &files.grid)?;
        let values = parse_float_column(&grid_df, &stored, &files.grid)?;
        Ok(select_active(values, &active).into())
    };
    let x = grid_column(grid::X)?;
    let y = grid_column(grid::Y)?;
    let volumes = grid_column(grid::VOLUME)?;
    let n_active = x.len();

    let init_df = read_csv_as_strings(&files.init)?;
    if init_df.height() != n_active {
        return Err(Co2Error::Validation(format!(
            "{} has {} rows, grid has {n_active} active cells",
            files.init.display(),
            init_df.height()
        )));
    }
    let poro_col = require_column(&init_df, init::PORO, &files.init)?;
    let poro = parse_float_column(&init_df, &poro_col, &files.init)?;
    let porv = find_column(&init_df, init::PORV)
        .map(|name| parse_float_column(&init_df, &name, &files.init))
        .transpose()?;

    info!("Reading restart data from {}", files.unrst.display());
    let (dates, properties) = read_restart(&files.unrst, n_active)?;

    let zone = match &files.zone {
        Some(path) => Some(read_zone(path, &active)?),
        None => None,
    };

    Ok(RawCellData {
        x,
        y,
        volumes,
        poro,
        porv,
        dates,
        properties,
        zone,
    })
}

/// Zone labels from the first column, one row per grid cell.
fn read_zone(path: &Path, active: &[bool]) -> Co2Result<Vec<String>> {
    let df = read_csv_as_strings(path)?;
    if df.height() != active.len() {
        return Err(Co2Error::Validation(format!(
            "{} has {} rows, grid has {} cells",
            path.display(),
            df.height(),
            active.len()
        )));
    }
    let labels = df
        .get_columns()
        .first()
        .ok_or_else(|| Co2Error::MissingColumn(format!("zone in {}", path.display())))?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().trim().to_string());
    Ok(select_active(labels, active))
}
