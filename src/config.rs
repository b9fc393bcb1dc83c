//! The parameter file, passed explicitly to whatever needs it.
//!
//! ```json
//! {
//!   "grid": "GLOB",
//!   "resol": "0p25",
//!   "validity": ["fcst"],
//!   "parameter": [
//!     {"shortName": ["tmp"], "typeOfLevel": "heightAboveGround", "level": 2},
//!     {"shortName": "prmsl"}
//!   ],
//!   "geo_coordinates": {"latitude": -22.72712, "longitude": -67.33196}
//! }
//! ```

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::{
    client::Request,
    coords::Coords,
    cycle::Cycle,
    errors::GfsFetchErr,
    filter::{self, Filter},
    models::{Grid, Model},
    urls::{self, UrlFormatter},
};

/// Contents of `parameter.json`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Model name, `gfs` when missing.
    #[serde(default)]
    pub model: Option<String>,
    /// `GLOB` or `SLS`.
    pub grid: String,
    /// Resolution of the global grid.
    #[serde(default)]
    pub resol: Option<String>,
    /// Parameter set suffix of the global grid.
    #[serde(default)]
    pub paramset: Option<String>,
    /// Alternative server.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Validity substrings applied to filters without their own.
    #[serde(default)]
    pub validity: Vec<String>,
    /// Wanted fields. Empty means whole files.
    #[serde(default)]
    pub parameter: Vec<Filter>,
    /// Run date `YYYYMMDD`, latest run when missing.
    #[serde(default, deserialize_with = "text_or_number")]
    pub date: Option<String>,
    /// Run hour.
    #[serde(default)]
    pub time: Option<u32>,
    /// Forecast hours.
    #[serde(default)]
    pub steps: Option<Vec<u32>>,
    /// Name pattern of the downloaded files.
    #[serde(default)]
    pub target: Option<String>,
    /// Number of data files a complete run has on the server.
    #[serde(default)]
    pub expected_files: Option<usize>,
    /// Where the forecast is wanted.
    #[serde(rename = "geo_coordinates")]
    pub geo_coordinates: Coords,
}

/// Accept `"20250123"` as well as `20250123`.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|val| match val {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Int(num) => num.to_string(),
            TextOrNumber::Float(num) => num.to_string(),
        }),
    )
}

impl Config {
    /// Default name of the parameter file.
    pub const FILE_NAME: &'static str = "parameter.json";

    /// Default download target.
    pub const DEFAULT_TARGET: &'static str = "download.grib2";

    /// Read and validate a parameter file.
    pub fn load(path: &dyn AsRef<Path>) -> Result<Self, GfsFetchErr> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a string, mostly for tests and embedded defaults.
    pub fn from_json(text: &str) -> Result<Self, GfsFetchErr> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), GfsFetchErr> {
        self.model()?;
        self.grid()?;
        self.date()?;
        filter::validate_all(&self.parameter)
    }

    /// The model.
    pub fn model(&self) -> Result<Model, GfsFetchErr> {
        match self.model {
            Some(ref name) => Ok(Model::from_str(name)?),
            None => Ok(Model::default()),
        }
    }

    /// The grid.
    pub fn grid(&self) -> Result<Grid, GfsFetchErr> {
        Ok(Grid::from_str(&self.grid)?)
    }

    /// The run date, if configured.
    pub fn date(&self) -> Result<Option<NaiveDate>, GfsFetchErr> {
        self.date
            .as_ref()
            .map(|date| NaiveDate::parse_from_str(date, "%Y%m%d").map_err(GfsFetchErr::from))
            .transpose()
    }

    /// URL formatter for the configured model, grid, resolution, and server.
    pub fn formatter(&self) -> Result<UrlFormatter, GfsFetchErr> {
        let mut formatter = UrlFormatter::new(self.model()?, self.grid()?);

        if let Some(ref resol) = self.resol {
            formatter = formatter.with_resol(resol.as_str());
        }
        if let Some(ref paramset) = self.paramset {
            formatter = formatter.with_paramset(paramset.as_str());
        }
        if let Some(ref base) = self.base_url {
            formatter = formatter.with_base(base.as_str());
        }

        Ok(formatter)
    }

    /// The retrieval request. `extended` picks the full 384 hour range when no steps are
    /// configured, `cycle` overrides the configured date and time.
    pub fn request(&self, extended: bool, cycle: Option<Cycle>) -> Result<Request, GfsFetchErr> {
        let steps = match self.steps {
            Some(ref steps) => steps.clone(),
            None if extended => urls::extended_steps(),
            None => urls::short_steps(),
        };

        let (date, time) = match cycle {
            Some(cycle) => (Some(cycle.init_time().date()), Some(cycle.hour())),
            None => (self.date()?, self.time),
        };

        Ok(Request {
            date,
            time,
            steps,
            parameter: self.parameter.clone(),
            validity: self.validity.clone(),
            expected_files: self.expected_files,
            target: self
                .target
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_TARGET.to_owned()),
        })
    }
}

/// The default root directory for parameter file, downloads, and forecast log.
pub fn default_root() -> Option<PathBuf> {
    dirs::home_dir().map(|hd| hd.join("gfs"))
}
