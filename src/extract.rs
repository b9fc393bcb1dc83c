//! Point values from downloaded GRIB files.
//!
//! Decoding GRIB2 is left to a `GribDecoder`, this module finds the grid box around the point,
//! interpolates, and collects the values of all files into one `Forecast`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDateTime;
use crossbeam_channel as channel;
use log::{debug, info, warn};

use crate::{
    coords::Coords,
    errors::GfsFetchErr,
    filter::Filter,
    forecast::{Forecast, Series},
};

const CAPACITY: usize = 16;

/// Format of the issuance and valid time stamps in the forecast log.
pub const TIME_FORMAT: &str = "%Y%m%d%H%M";

/// A decoded GRIB message on a regular latitude-longitude grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Parameter name, e.g. `Temperature`.
    pub name: String,
    /// GRIB short name, e.g. `2t`.
    pub short_name: String,
    /// Units of the values.
    pub units: String,
    /// `instant`, `avg`, `accum`, ...
    pub step_type: String,
    /// GRIB level type key, e.g. `heightAboveGround`.
    pub type_of_level: String,
    /// Level value.
    pub level: String,
    /// Initialization time of the run.
    pub issued: NaiveDateTime,
    /// Valid time.
    pub valid: NaiveDateTime,
    /// Latitudes of the rows, north to south.
    pub lats: Vec<f64>,
    /// Longitudes of the columns, west to east in [0, 360).
    pub lons: Vec<f64>,
    /// Row major, `lats.len() * lons.len()` values.
    pub values: Vec<f64>,
}

impl Field {
    /// Key of the parameter in a `Forecast`.
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.name, self.step_type, self.type_of_level, self.level
        )
    }

    fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row * self.lons.len() + col).copied()
    }

    /// Bilinear interpolation at `point`. `None` outside the grid or for missing values.
    pub fn interpolate(&self, point: Coords) -> Option<f64> {
        let point = point.to_east_positive();
        let gb = GridBox::enclosing(point, &self.lats, &self.lons)?;

        let tx = fraction(point.lon, gb.lon1, gb.lon2);
        let ty = fraction(point.lat, gb.lat1, gb.lat2);

        let along = |row| -> Option<f64> {
            Some(self.value(row, gb.west)? * (1.0 - tx) + self.value(row, gb.east)? * tx)
        };
        let south = along(gb.south)?;
        let north = along(gb.north)?;

        Some(south * (1.0 - ty) + north * ty).filter(|val| val.is_finite())
    }
}

fn fraction(x: f64, x1: f64, x2: f64) -> f64 {
    if x2 > x1 {
        (x - x1) / (x2 - x1)
    } else {
        0.0
    }
}

/// The grid cell enclosing a point, as row and column indices plus their coordinates.
///
/// `lon2` is `lon1` of the first column plus 360 when the cell wraps around the date line of a
/// global grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridBox {
    /// Row of `lat2`.
    pub north: usize,
    /// Row of `lat1`.
    pub south: usize,
    /// Column of `lon1`.
    pub west: usize,
    /// Column of `lon2`.
    pub east: usize,
    /// Southern latitude.
    pub lat1: f64,
    /// Northern latitude.
    pub lat2: f64,
    /// Western longitude.
    pub lon1: f64,
    /// Eastern longitude.
    pub lon2: f64,
}

impl GridBox {
    /// Find the cell around `point` in a grid with descending `lats` and ascending `lons`.
    ///
    /// A point on a grid line gets a degenerate cell on that line.
    pub fn enclosing(point: Coords, lats: &[f64], lons: &[f64]) -> Option<GridBox> {
        let point = point.to_east_positive();

        let (north, south) = rows(lats, point.lat)?;
        let (west, east, lon2) = columns(lons, point.lon)?;

        Some(GridBox {
            north,
            south,
            west,
            east,
            lat1: lats[south],
            lat2: lats[north],
            lon1: lons[west],
            lon2,
        })
    }
}

fn rows(lats: &[f64], lat: f64) -> Option<(usize, usize)> {
    let last = lats.len().checked_sub(1)?;
    if lat > lats[0] || lat < lats[last] {
        return None;
    }

    match lats.iter().position(|&l| lat > l) {
        Some(i) => Some((i - 1, i)),
        None => Some((last, last)),
    }
}

fn columns(lons: &[f64], lon: f64) -> Option<(usize, usize, f64)> {
    let last = lons.len().checked_sub(1)?;
    if lon < lons[0] {
        return None;
    }

    match lons.iter().position(|&l| lon < l) {
        Some(i) => Some((i - 1, i, lons[i])),
        None if lon == lons[last] => Some((last, last, lons[last])),
        None if last > 0 => {
            // Wrap to the first column if the grid goes all the way around.
            let step = lons[last] - lons[last - 1];
            let wrapped = lons[0] + 360.0;
            if (lons[last] + step - wrapped).abs() < 1.0e-6 && lon < wrapped {
                Some((last, 0, wrapped))
            } else {
                None
            }
        }
        None => None,
    }
}

/// Decodes a local GRIB2 file into fields.
pub trait GribDecoder: Send + Sync {
    /// All messages of the file.
    fn decode(&self, path: &Path) -> Result<Vec<Field>, GfsFetchErr>;
}

/// The values extracted from one or more files of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    /// Initialization time, `YYYYMMDDHHMM`.
    pub issued: String,
    /// Extracted values.
    pub forecast: Forecast,
}

impl Extraction {
    fn merge(&mut self, other: Extraction) {
        if other.issued != self.issued {
            warn!("mixed runs {} and {}", self.issued, other.issued);
            if other.issued < self.issued {
                self.issued = other.issued;
            }
        }

        self.forecast.merge(other.forecast);
    }
}

/// How to run `extract_all`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// One worker per file instead of one file after another.
    pub parallel: bool,
    /// Keep the GRIB files after extraction.
    pub keep: bool,
}

/// Extract the fields of one file selected by any of `filters` at `point`, all without filters.
pub fn extract(
    decoder: &dyn GribDecoder,
    path: &Path,
    point: Coords,
    filters: &[Filter],
    keep: bool,
) -> Result<Extraction, GfsFetchErr> {
    let fields = decoder.decode(path)?;

    let issued = fields
        .first()
        .map(|fld| fld.issued.format(TIME_FORMAT).to_string())
        .ok_or_else(|| GfsFetchErr::GeneralError(format!("no messages in {}", path.display())))?;

    let mut forecast = Forecast::default();
    for field in fields {
        if !filters.is_empty() && !filters.iter().any(|flt| flt.selects(&field)) {
            debug!("{}: not selected", field.key());
            continue;
        }

        match field.interpolate(point) {
            Some(value) => {
                let time = field.valid.format(TIME_FORMAT).to_string();
                forecast.insert(field.key(), Series::single(&field.units, time, value));
            }
            None => debug!("{}: no value at {:?}", field.key(), point),
        }
    }

    if !keep {
        fs::remove_file(path)?;
        debug!("Removed {}", path.display());
    }

    Ok(Extraction { issued, forecast })
}

/// Extract all files and merge the results into one forecast.
pub fn extract_all(
    decoder: Arc<dyn GribDecoder>,
    paths: &[PathBuf],
    point: Coords,
    filters: &[Filter],
    options: ExtractOptions,
) -> Result<Extraction, GfsFetchErr> {
    let results: Vec<Result<Extraction, GfsFetchErr>> = if options.parallel {
        extract_parallel(decoder, paths, point, filters, options.keep)
    } else {
        paths
            .iter()
            .map(|path| extract(decoder.as_ref(), path, point, filters, options.keep))
            .collect()
    };

    // A worker that panicked sends nothing.
    if results.len() != paths.len() {
        return Err(GfsFetchErr::GeneralError(format!(
            "{} of {} files not extracted",
            paths.len() - results.len(),
            paths.len()
        )));
    }

    let mut merged: Option<Extraction> = None;
    for res in results {
        let extraction = res?;
        match merged {
            Some(ref mut acc) => acc.merge(extraction),
            None => merged = Some(extraction),
        }
    }

    let merged =
        merged.ok_or_else(|| GfsFetchErr::GeneralError("nothing to extract".to_owned()))?;
    info!(
        "{} parameter(s) extracted for the {} run",
        merged.forecast.len(),
        merged.issued
    );

    Ok(merged)
}

fn extract_parallel(
    decoder: Arc<dyn GribDecoder>,
    paths: &[PathBuf],
    point: Coords,
    filters: &[Filter],
    keep: bool,
) -> Vec<Result<Extraction, GfsFetchErr>> {
    let pool = threadpool::Builder::new()
        .num_threads(paths.len().max(1))
        .thread_name("GribExtract_".to_string())
        .build();

    let (results_snd, results_rcv) = channel::bounded(CAPACITY);
    let filters: Arc<[Filter]> = filters.into();

    for path in paths {
        let local_decoder = Arc::clone(&decoder);
        let local_filters = Arc::clone(&filters);
        let local_results = results_snd.clone();
        let path = path.clone();

        pool.execute(move || {
            let res = extract(local_decoder.as_ref(), &path, point, &local_filters, keep);
            if local_results.send(res).is_err() {
                warn!("Result for {} dropped", path.display());
            }
        });
    }
    drop(results_snd);

    results_rcv.into_iter().collect()
}
