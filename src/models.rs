//! Models and grids available on the NOMADS server.

use std::fmt;
use strum_macros::{AsStaticStr, EnumIter, EnumString};

/// Models potentially retrieved.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, AsStaticStr, EnumIter, Hash)]
pub enum Model {
    /// The U.S. Global Forecast System
    #[strum(to_string = "gfs", serialize = "GFS")]
    GFS,
    /// The Global Data Assimilation System, the analysis side of the GFS.
    #[strum(to_string = "gdas", serialize = "GDAS")]
    GDAS,
    /// The ensemble Kalman filter member runs of the GDAS.
    #[strum(to_string = "enkfgdas", serialize = "ENKFGDAS")]
    EnkfGDAS,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Model::*;

        match *self {
            GFS => write!(f, "{}", stringify!(GFS)),
            GDAS => write!(f, "{}", stringify!(GDAS)),
            EnkfGDAS => write!(f, "{}", stringify!(EnkfGDAS)),
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::GFS
    }
}

/// The file families a model run is published in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, AsStaticStr, EnumIter, Hash)]
pub enum Grid {
    /// Semi-Lagrangian surface flux grid, a Gaussian grid of 360 / 1536 degrees.
    #[strum(to_string = "SLS", serialize = "sls")]
    SemiLagrangian,
    /// The global longitude/latitude grid, resolution picked by `resol`.
    #[strum(to_string = "GLOB", serialize = "glob")]
    Global,
}

impl Default for Grid {
    fn default() -> Self {
        Grid::Global
    }
}

/// Level types as GRIB keys name them, mapped onto the wording of `.idx` level descriptions.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, AsStaticStr, EnumIter, Hash)]
#[allow(missing_docs)]
pub enum LevelType {
    #[strum(serialize = "heightAboveGround")]
    HeightAboveGround,
    #[strum(serialize = "heightAboveSea")]
    HeightAboveSea,
    #[strum(serialize = "isobaricInhPa")]
    IsobaricInhPa,
    #[strum(serialize = "pressureFromGroundLayer")]
    PressureFromGroundLayer,
    #[strum(serialize = "depthBelowLandLayer")]
    DepthBelowLandLayer,
    #[strum(serialize = "surface")]
    Surface,
    #[strum(serialize = "meanSea")]
    MeanSea,
    #[strum(serialize = "entireAtmosphere")]
    EntireAtmosphere,
    #[strum(serialize = "tropopause")]
    Tropopause,
    #[strum(serialize = "maxWind")]
    MaxWind,
    #[strum(serialize = "nominalTop")]
    NominalTop,
    #[strum(serialize = "sigma")]
    Sigma,
}

impl LevelType {
    /// The phrase NCEP uses for this level type in an index line, e.g. "2 m above ground".
    pub fn idx_phrase(self) -> &'static str {
        use LevelType::*;

        match self {
            HeightAboveGround => "m above ground",
            HeightAboveSea => "m above mean sea level",
            IsobaricInhPa => " mb",
            PressureFromGroundLayer => "mb above ground",
            DepthBelowLandLayer => "m below ground",
            Surface => "surface",
            MeanSea => "mean sea level",
            EntireAtmosphere => "entire atmosphere",
            Tropopause => "tropopause",
            MaxWind => "max wind",
            NominalTop => "top of atmosphere",
            Sigma => "sigma",
        }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
