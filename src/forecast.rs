//! Point forecasts and the `forecast.json` log they are kept in.

use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::GfsFetchErr;

/// Values of one parameter over the forecast hours.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Series {
    /// Valid times, `YYYYMMDDHHMM`.
    pub time: Vec<String>,
    /// Unit of the values.
    pub unit: String,
    /// One value per valid time.
    pub value: Vec<f64>,
}

impl Series {
    /// A series with a single value.
    pub fn single(unit: &str, time: String, value: f64) -> Self {
        Series {
            unit: unit.to_owned(),
            time: vec![time],
            value: vec![value],
        }
    }

    /// Merge another series in, the result is ordered by time.
    ///
    /// For a time present in both, the value of `other` is kept.
    pub fn merge(&mut self, other: Series) {
        let merged: BTreeMap<String, f64> = self
            .time
            .drain(..)
            .zip(self.value.drain(..))
            .chain(other.time.into_iter().zip(other.value.into_iter()))
            .collect();

        let (time, value): (Vec<String>, Vec<f64>) = merged.into_iter().unzip();
        self.time = time;
        self.value = value;
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// True if there are no values.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Parameter key, `name:stepType:typeOfLevel:level`, to series.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Forecast {
    series: BTreeMap<String, Series>,
}

impl Forecast {
    /// Add a series, merged with what is already there under `key`.
    pub fn insert(&mut self, key: String, series: Series) {
        match self.series.get_mut(&key) {
            Some(existing) => existing.merge(series),
            None => {
                self.series.insert(key, series);
            }
        }
    }

    /// Merge a whole forecast, e.g. the result of another forecast hour.
    pub fn merge(&mut self, other: Forecast) {
        for (key, series) in other.series {
            self.insert(key, series);
        }
    }

    /// A series by key.
    pub fn get(&self, key: &str) -> Option<&Series> {
        self.series.get(key)
    }

    /// Parameter keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True if no parameter has been extracted.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The forecast log, issuance time `YYYYMMDDHHMM` to forecast.
#[derive(Clone, Debug)]
pub struct ForecastLog {
    path: PathBuf,
}

impl ForecastLog {
    /// Default file name in the data root.
    pub const FILE_NAME: &'static str = "forecast.json";

    /// A log stored at `path`.
    pub fn new(path: &dyn AsRef<Path>) -> Self {
        ForecastLog {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The log in a data root directory.
    pub fn in_root(root: &dyn AsRef<Path>) -> Self {
        Self::new(&root.as_ref().join(Self::FILE_NAME))
    }

    /// Location of the log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All forecasts in the log, an empty map if there is no log yet.
    pub fn read(&self) -> Result<BTreeMap<String, Forecast>, GfsFetchErr> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Store `forecast` under `issued`, replacing an older entry of the same issuance.
    pub fn write(&self, issued: &str, forecast: &Forecast) -> Result<(), GfsFetchErr> {
        if !self.path.exists() {
            let mut file = File::create(&self.path)?;
            file.write_all(b"{}")?;
            debug!("Created {}", self.path.display());
        }

        let mut log = self.read()?;
        log.insert(issued.to_owned(), forecast.clone());

        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &log)?;
        writer.flush()?;

        debug!(
            "{} holds {}",
            self.path.display(),
            log.keys().map(String::as_str).join(", ")
        );

        Ok(())
    }
}
