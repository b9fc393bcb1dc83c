//! Build the URLs of the files of a model run on the NOMADS server.

use regex::Regex;
use strum::AsStaticRef;

use crate::{
    cycle::Cycle,
    errors::GfsFetchErr,
    models::{Grid, Model},
};

/// Production directory of the GFS on NOMADS.
pub static HOST_URL: &str = "https://nomads.ncep.noaa.gov/pub/data/nccf/com/gfs/prod";

/// Last forecast hour of the hourly part of a GFS run.
const LAST_HOURLY_STEP: u32 = 120;

/// Last forecast hour of a GFS run.
const LAST_STEP: u32 = 384;

/// Forecast hours of a complete run, hourly out to 120 h then every 3 h out to 384 h.
pub fn extended_steps() -> Vec<u32> {
    (0..=LAST_HOURLY_STEP)
        .chain((LAST_HOURLY_STEP + 3..=LAST_STEP).step_by(3))
        .collect()
}

/// Forecast hours of the hourly part of a run.
pub fn short_steps() -> Vec<u32> {
    (0..=LAST_HOURLY_STEP).collect()
}

/// Formats the location of each forecast file of a run.
#[derive(Clone, Debug)]
pub struct UrlFormatter {
    base: String,
    model: Model,
    grid: Grid,
    resol: String,
    paramset: String,
}

impl UrlFormatter {
    /// Default horizontal resolution of the global grid.
    pub const DEFAULT_RESOL: &'static str = "0p25";

    /// Create a formatter pointing at the production server.
    pub fn new(model: Model, grid: Grid) -> Self {
        UrlFormatter {
            base: HOST_URL.to_owned(),
            model,
            grid,
            resol: Self::DEFAULT_RESOL.to_owned(),
            paramset: String::new(),
        }
    }

    /// Use another server or mirror.
    pub fn with_base<T: Into<String>>(self, base: T) -> Self {
        let base = base.into().trim_end_matches('/').to_owned();
        UrlFormatter { base, ..self }
    }

    /// Resolution token of the global grid, e.g. `0p25`, `0p50`, `1p00`.
    pub fn with_resol<T: Into<String>>(self, resol: T) -> Self {
        UrlFormatter {
            resol: resol.into(),
            ..self
        }
    }

    /// Parameter set suffix of the global grid, e.g. `b` for the `pgrb2b` files.
    pub fn with_paramset<T: Into<String>>(self, paramset: T) -> Self {
        UrlFormatter {
            paramset: paramset.into(),
            ..self
        }
    }

    /// The directory holding all files of a run.
    pub fn cycle_dir(&self, cycle: &Cycle) -> String {
        format!(
            "{}/{}.{}/{:02}/atmos/",
            self.base,
            self.model.as_static(),
            cycle.yyyymmdd(),
            cycle.hour()
        )
    }

    // Everything in a file name before the forecast hour.
    fn file_prefix(&self, cycle: &Cycle) -> String {
        let common = format!("{}.t{:02}z.", self.model.as_static(), cycle.hour());

        match self.grid {
            Grid::SemiLagrangian => format!("{}sfluxgrbf", common),
            Grid::Global => format!("{}pgrb2{}.{}.f", common, self.paramset, self.resol),
        }
    }

    fn file_suffix(&self) -> &'static str {
        match self.grid {
            Grid::SemiLagrangian => ".grib2",
            Grid::Global => "",
        }
    }

    /// Name of the file for one forecast hour.
    pub fn file_name(&self, cycle: &Cycle, step: u32) -> String {
        format!("{}{:03}{}", self.file_prefix(cycle), step, self.file_suffix())
    }

    /// URL of the file for one forecast hour.
    pub fn url(&self, cycle: &Cycle, step: u32) -> String {
        format!("{}{}", self.cycle_dir(cycle), self.file_name(cycle, step))
    }

    /// URLs for all requested forecast hours, in the order given.
    pub fn urls(&self, cycle: &Cycle, steps: &[u32]) -> Vec<String> {
        steps.iter().map(|&step| self.url(cycle, step)).collect()
    }

    /// Matches the names of the data files of a run, index files and other grids excluded.
    pub fn data_file_regex(&self, cycle: &Cycle) -> Result<Regex, GfsFetchErr> {
        let pattern = format!(
            r"^{}\d{{3}}{}$",
            regex::escape(&self.file_prefix(cycle)),
            regex::escape(self.file_suffix())
        );

        Ok(Regex::new(&pattern)?)
    }

    /// True if `name` is a data file of this run, index files and other grids excluded.
    pub fn is_data_file(&self, cycle: &Cycle, name: &str) -> bool {
        self.data_file_regex(cycle)
            .map(|re| re.is_match(name))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod unit {
    use super::*;
    use chrono::NaiveDate;

    fn cycle() -> Cycle {
        Cycle::new(NaiveDate::from_ymd_opt(2025, 1, 23).unwrap(), 6).unwrap()
    }

    #[test]
    fn test_global_url() {
        let fmt = UrlFormatter::new(Model::GFS, Grid::Global);
        assert_eq!(
            fmt.url(&cycle(), 3),
            "https://nomads.ncep.noaa.gov/pub/data/nccf/com/gfs/prod/\
             gfs.20250123/06/atmos/gfs.t06z.pgrb2.0p25.f003"
        );

        let fmt = fmt.with_paramset("b").with_resol("0p50");
        assert!(fmt.url(&cycle(), 120).ends_with("gfs.t06z.pgrb2b.0p50.f120"));
    }

    #[test]
    fn test_semi_lagrangian_url() {
        let fmt = UrlFormatter::new(Model::GDAS, Grid::SemiLagrangian).with_base("http://mirror/");
        assert_eq!(
            fmt.url(&cycle(), 9),
            "http://mirror/gdas.20250123/06/atmos/gdas.t06z.sfluxgrbf009.grib2"
        );
    }

    #[test]
    fn test_steps() {
        let steps = extended_steps();
        assert_eq!(steps.len(), 121 + 88);
        assert_eq!(steps[120], 120);
        assert_eq!(steps[121], 123);
        assert_eq!(*steps.last().unwrap(), 384);

        assert_eq!(short_steps().len(), 121);
    }

    #[test]
    fn test_is_data_file() {
        let fmt = UrlFormatter::new(Model::GFS, Grid::Global);
        let c = cycle();
        assert!(fmt.is_data_file(&c, "gfs.t06z.pgrb2.0p25.f000"));
        assert!(fmt.is_data_file(&c, "gfs.t06z.pgrb2.0p25.f384"));
        assert!(!fmt.is_data_file(&c, "gfs.t06z.pgrb2.0p25.f384.idx"));
        assert!(!fmt.is_data_file(&c, "gfs.t06z.pgrb2.1p00.f003"));
        assert!(!fmt.is_data_file(&c, "gfs.t00z.pgrb2.0p25.f003"));

        let sls = UrlFormatter::new(Model::GFS, Grid::SemiLagrangian);
        assert!(sls.is_data_file(&c, "gfs.t06z.sfluxgrbf012.grib2"));
        assert!(!sls.is_data_file(&c, "gfs.t06z.sfluxgrbf012.grib2.idx"));
        assert!(!sls.is_data_file(&c, "gfs.t06z.sfluxgrbf1234.grib2"));
        assert!(!sls.is_data_file(&c, "xgfs.t06z.sfluxgrbf012.grib2"));
    }

    #[test]
    fn test_data_file_regex_escapes_dots() {
        let fmt = UrlFormatter::new(Model::GFS, Grid::Global);
        let re = fmt.data_file_regex(&cycle()).unwrap();
        assert!(re.is_match("gfs.t06z.pgrb2.0p25.f042"));
        assert!(!re.is_match("gfs.t06z.pgrb2x0p25.f042"));
        assert!(!re.is_match("gfs.t06z.pgrb2.0p25.f04"));
    }
}
