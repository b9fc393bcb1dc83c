//! Client for the GFS files on NOMADS.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::{
    filter::Filter,
    remote::{HttpRemote, Remote},
    urls::UrlFormatter,
};

pub use self::{
    download::Retrieval,
    retry::{Planned, RetryState},
};

/// The client.
#[derive(Debug)]
pub struct Client<R: Remote = HttpRemote> {
    remote: R,                     // Where the files come from.
    formatter: UrlFormatter,       // Builds the URLs of a run.
    index_dump: Option<PathBuf>,   // Write the parsed indices here, if set.
}

/// What to retrieve.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Request {
    /// Run date, latest run when missing.
    pub date: Option<NaiveDate>,
    /// Run hour, 18 UTC when missing or not a synoptic hour and a date is given.
    pub time: Option<u32>,
    /// Forecast hours, one remote file each.
    pub steps: Vec<u32>,
    /// Wanted fields, whole files when empty.
    pub parameter: Vec<Filter>,
    /// Validity substrings for filters without their own.
    pub validity: Vec<String>,
    /// Verify the run has this many files before planning.
    pub expected_files: Option<usize>,
    /// Local file name pattern, a counter is inserted before `.grib2`.
    pub target: String,
}

mod download;
mod fetch;
mod retry;

impl Client<HttpRemote> {
    /// Client for the production server, or the mirror configured in `formatter`.
    pub fn connect(formatter: UrlFormatter) -> Self {
        Client::new(HttpRemote::new(), formatter)
    }
}

impl<R: Remote> Client<R> {
    /// Client over any `Remote`.
    pub fn new(remote: R, formatter: UrlFormatter) -> Self {
        Client {
            remote,
            formatter,
            index_dump: None,
        }
    }

    /// Dump the parsed indices of every planning attempt as JSON to `path`.
    pub fn with_index_dump(self, path: PathBuf) -> Self {
        Client {
            index_dump: Some(path),
            ..self
        }
    }

    /// The URL formatter.
    pub fn formatter(&self) -> &UrlFormatter {
        &self.formatter
    }
}
