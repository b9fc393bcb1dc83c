#![deny(missing_docs)]
//! Plan and download the parts of GFS forecast files needed for a point forecast.
//!
//! The index (`.idx`) published next to every GRIB2 file on NOMADS lists the byte offset of each
//! message. Filters select messages by short name, level, and validity, and only those byte
//! ranges are downloaded.

//
// Public API
//
pub use crate::client::{Client, Planned, Request, Retrieval, RetryState};
pub use crate::cmd_line::CommonCmdLineArgs;
pub use crate::config::{default_root, Config};
pub use crate::coords::Coords;
pub use crate::cycle::Cycle;
pub use crate::errors::GfsFetchErr;
pub use crate::extract::{
    extract, extract_all, ExtractOptions, Extraction, Field, GribDecoder, GridBox,
};
pub use crate::filter::{Filter, ShortNames};
pub use crate::forecast::{Forecast, ForecastLog, Series};
pub use crate::index::{FileIndex, Record};
pub use crate::models::{Grid, LevelType, Model};
pub use crate::plan::{select_ranges, DownloadPlan, PlanEntry, SelectedRange};
pub use crate::remote::{HttpRemote, Remote};
pub use crate::urls::{extended_steps, short_steps, UrlFormatter, HOST_URL};

//
// Implementation only
//
#[macro_use]
extern crate clap;

mod client;
mod cmd_line;
mod config;
mod coords;
mod cycle;
mod errors;
mod extract;
mod filter;
mod forecast;
mod index;
mod models;
mod plan;
mod remote;
mod urls;
